//! wgpu compute backend for terrain displacement and sculpting.
//!
//! Every call uploads the vertices into a fresh storage buffer, dispatches one
//! invocation per vertex, copies the results into staging buffers and blocks
//! until they are mapped. All buffers are destroyed before the call returns.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use wgpu::util::DeviceExt;

use crate::{BiomeSignal, Displacement, DisplacementError, GenerationParams, NoiseDisplacementPort};

const WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DisplaceUniforms {
    seed_offset: [f32; 4],
    radius: f32,
    noise_scale: f32,
    persistence: f32,
    lacunarity: f32,
    height_multiplier: f32,
    sea_level: f32,
    temperature_bias: f32,
    humidity_bias: f32,
    octaves: u32,
    archetype: u32,
    count: u32,
    _pad: u32,
}

impl DisplaceUniforms {
    fn new(params: &GenerationParams, count: u32) -> Self {
        let o = params.seed_offset.as_vec3();
        Self {
            seed_offset: [o.x, o.y, o.z, 0.0],
            radius: params.radius as f32,
            noise_scale: params.noise_scale as f32,
            persistence: params.persistence as f32,
            lacunarity: params.lacunarity as f32,
            height_multiplier: params.height_multiplier as f32,
            sea_level: params.sea_level as f32,
            temperature_bias: params.archetype.temperature_bias() as f32,
            humidity_bias: params.archetype.humidity_bias() as f32,
            octaves: params.octaves,
            archetype: params.archetype.id(),
            count,
            _pad: 0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct SculptUniforms {
    center_radius: [f32; 4],
    strength: f32,
    count: u32,
    _pad0: u32,
    _pad1: u32,
}

fn unavailable(reason: impl std::fmt::Display) -> DisplacementError {
    DisplacementError::Unavailable(reason.to_string())
}

/// Device, queue and the two compute pipelines.
struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    displace: wgpu::ComputePipeline,
    sculpt: wgpu::ComputePipeline,
}

impl GpuContext {
    async fn new() -> Result<Self, DisplacementError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| unavailable(format!("no compatible GPU adapter: {e}")))?;

        let info = adapter.get_info();
        log::info!(
            "Terrain compute on {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("terra-compute-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| unavailable(format!("failed to request GPU device: {e}")))?;

        let displace = create_pipeline(&device, "displace", include_str!("shaders/displace.wgsl"));
        let sculpt = create_pipeline(&device, "sculpt", include_str!("shaders/sculpt.wgsl"));

        Ok(Self {
            device,
            queue,
            displace,
            sculpt,
        })
    }

    fn storage_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            })
    }

    fn staging_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        count: u32,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("terra-compute-pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }

    /// Block until `buffer` is mapped and copy its contents out.
    fn read_back<T: Pod>(&self, buffer: &wgpu::Buffer) -> Result<Vec<T>, DisplacementError> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| unavailable(format!("device poll failed: {e}")))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(unavailable(format!("readback mapping failed: {e}"))),
            Err(_) => return Err(unavailable("readback callback dropped")),
        }

        let data = {
            let mapped = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, T>(&mapped).to_vec()
        };
        buffer.unmap();
        Ok(data)
    }
}

fn create_pipeline(device: &wgpu::Device, name: &str, source: &str) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(name),
        layout: None,
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn pack_positions(vertices: &[DVec3]) -> Vec<[f32; 4]> {
    vertices
        .iter()
        .map(|v| [v.x as f32, v.y as f32, v.z as f32, 1.0])
        .collect()
}

fn unpack_positions(packed: &[[f32; 4]]) -> Vec<DVec3> {
    packed
        .iter()
        .map(|p| DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect()
}

/// Displacement backend running on the GPU through wgpu compute shaders.
///
/// Results are computed in `f32` and are close to, but not bit-identical with,
/// [`CpuDisplacement`](crate::CpuDisplacement).
pub struct GpuDisplacement {
    context: Option<GpuContext>,
}

impl GpuDisplacement {
    /// A backend with no device. Every call reports
    /// [`DisplacementError::Unavailable`] until [`initialize`](Self::initialize) succeeds.
    pub fn uninitialized() -> Self {
        Self { context: None }
    }

    /// Create and initialize a backend.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::Unavailable`] if no adapter or device can be acquired.
    pub fn new() -> Result<Self, DisplacementError> {
        let mut backend = Self::uninitialized();
        backend.initialize()?;
        Ok(backend)
    }

    /// Acquire a device and build the compute pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::Unavailable`] if no adapter or device can be acquired.
    pub fn initialize(&mut self) -> Result<(), DisplacementError> {
        if self.context.is_none() {
            self.context = Some(pollster::block_on(GpuContext::new())?);
        }
        Ok(())
    }

    /// Whether a device is attached.
    pub fn is_ready(&self) -> bool {
        self.context.is_some()
    }

    fn context(&self) -> Result<&GpuContext, DisplacementError> {
        self.context
            .as_ref()
            .ok_or_else(|| unavailable("GPU backend not initialized"))
    }
}

fn vertex_count(len: usize) -> Result<u32, DisplacementError> {
    u32::try_from(len).map_err(|_| unavailable(format!("batch of {len} vertices too large")))
}

impl NoiseDisplacementPort for GpuDisplacement {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn displace(
        &self,
        vertices: &[DVec3],
        params: &GenerationParams,
    ) -> Result<Displacement, DisplacementError> {
        let ctx = self.context()?;
        if vertices.is_empty() {
            return Ok(Displacement::default());
        }
        let count = vertex_count(vertices.len())?;

        let uniforms = DisplaceUniforms::new(params, count);
        let uniform_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terra-displace-uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let positions = pack_positions(vertices);
        let position_buffer =
            ctx.storage_buffer("terra-displace-positions", bytemuck::cast_slice(&positions));
        let biome_init = vec![[0.5f32; 2]; vertices.len()];
        let biome_buffer =
            ctx.storage_buffer("terra-displace-biome", bytemuck::cast_slice(&biome_init));

        let position_size = position_buffer.size();
        let biome_size = biome_buffer.size();
        let position_staging =
            ctx.staging_buffer("terra-displace-positions-staging", position_size);
        let biome_staging = ctx.staging_buffer("terra-displace-biome-staging", biome_size);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terra-displace-bind-group"),
            layout: &ctx.displace.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: biome_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("terra-displace-encoder"),
            });
        ctx.dispatch(&mut encoder, &ctx.displace, &bind_group, count);
        encoder.copy_buffer_to_buffer(&position_buffer, 0, &position_staging, 0, position_size);
        encoder.copy_buffer_to_buffer(&biome_buffer, 0, &biome_staging, 0, biome_size);
        ctx.queue.submit(Some(encoder.finish()));

        let result = ctx.read_back::<[f32; 4]>(&position_staging).and_then(|positions| {
            let biome = ctx.read_back::<[f32; 2]>(&biome_staging)?;
            Ok(Displacement {
                vertices: unpack_positions(&positions),
                biome: biome
                    .iter()
                    .map(|b| BiomeSignal::new(b[0] as f64, b[1] as f64))
                    .collect(),
            })
        });

        for buffer in [
            uniform_buffer,
            position_buffer,
            biome_buffer,
            position_staging,
            biome_staging,
        ] {
            buffer.destroy();
        }
        result
    }

    fn sculpt(
        &self,
        vertices: &[DVec3],
        brush: DVec3,
        radius: f64,
        signed_strength: f64,
    ) -> Result<Vec<DVec3>, DisplacementError> {
        let ctx = self.context()?;
        if vertices.is_empty() {
            return Ok(Vec::new());
        }
        let count = vertex_count(vertices.len())?;

        let b = brush.as_vec3();
        let uniforms = SculptUniforms {
            center_radius: [b.x, b.y, b.z, radius as f32],
            strength: signed_strength as f32,
            count,
            _pad0: 0,
            _pad1: 0,
        };
        let uniform_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("terra-sculpt-uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let positions = pack_positions(vertices);
        let position_buffer =
            ctx.storage_buffer("terra-sculpt-positions", bytemuck::cast_slice(&positions));
        let size = position_buffer.size();
        let staging = ctx.staging_buffer("terra-sculpt-staging", size);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terra-sculpt-bind-group"),
            layout: &ctx.sculpt.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: position_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("terra-sculpt-encoder"),
            });
        ctx.dispatch(&mut encoder, &ctx.sculpt, &bind_group, count);
        encoder.copy_buffer_to_buffer(&position_buffer, 0, &staging, 0, size);
        ctx.queue.submit(Some(encoder.finish()));

        let result = ctx
            .read_back::<[f32; 4]>(&staging)
            .map(|packed| {
                // Vertices outside the brush come back untouched in full precision.
                unpack_positions(&packed)
                    .into_iter()
                    .zip(vertices)
                    .map(|(moved, &original)| {
                        if original.distance(brush) < radius {
                            moved
                        } else {
                            original
                        }
                    })
                    .collect()
            });

        for buffer in [uniform_buffer, position_buffer, staging] {
            buffer.destroy();
        }
        result
    }
}
