//! Face UV → cube → sphere projection and its inverse.

use glam::{DVec2, DVec3};

use crate::CubeFace;

/// Convert a face UV in `[0, 1]²` to a point on the surface of the `[-1, 1]` cube.
///
/// The face center `(0.5, 0.5)` maps to the face normal.
#[inline]
#[must_use]
pub fn face_uv_to_cube_point(face: CubeFace, uv: DVec2) -> DVec3 {
    face.normal() + (uv.x - 0.5) * 2.0 * face.axis_a() + (uv.y - 0.5) * 2.0 * face.axis_b()
}

/// Project a face UV onto the unit sphere by normalizing its cube point.
#[inline]
#[must_use]
pub fn face_uv_to_sphere(face: CubeFace, uv: DVec2) -> DVec3 {
    face_uv_to_cube_point(face, uv).normalize()
}

/// Determine which cube face a direction vector belongs to.
///
/// The face is determined by the axis with the largest absolute component.
/// Ties are broken by a fixed priority: X > Y > Z, positive > negative.
#[must_use]
pub fn direction_to_face(dir: DVec3) -> CubeFace {
    let ax = dir.x.abs();
    let ay = dir.y.abs();
    let az = dir.z.abs();

    if ax >= ay && ax >= az {
        if dir.x >= 0.0 {
            CubeFace::PosX
        } else {
            CubeFace::NegX
        }
    } else if ay >= az {
        if dir.y >= 0.0 {
            CubeFace::PosY
        } else {
            CubeFace::NegY
        }
    } else if dir.z >= 0.0 {
        CubeFace::PosZ
    } else {
        CubeFace::NegZ
    }
}

/// Resolve a direction from the planet center to its face and face UV.
///
/// Exact inverse of [`face_uv_to_sphere`]. Returns `None` for zero-length or
/// non-finite directions.
#[must_use]
pub fn direction_to_face_uv(dir: DVec3) -> Option<(CubeFace, DVec2)> {
    if !dir.is_finite() || dir.length_squared() < 1e-30 {
        return None;
    }
    let face = direction_to_face(dir);
    let projected = dir / dir.dot(face.normal());

    let s = projected.dot(face.axis_a());
    let t = projected.dot(face.axis_b());
    let uv = DVec2::new((s + 1.0) * 0.5, (t + 1.0) * 0.5).clamp(DVec2::ZERO, DVec2::ONE);
    Some((face, uv))
}
