//! Compute-shader field backend.
//!
//! Two storage buffers hold the fields; bind group `i` reads buffer `i` and
//! writes buffer `1 - i`, so a step always runs with the bind group of the
//! previous slot. Read-back copies the next buffer into a staging buffer and
//! blocks until it is mapped.

use bytemuck::{Pod, Zeroable};
use log::debug;
use std::sync::Arc;
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::error::SessionError;
use crate::field::{Field, SeedPattern, INITIAL_PREVIOUS};
use crate::instrument::FieldBackend;
use crate::params::SimulationParams;

/// Threads per workgroup along each axis (matches `@workgroup_size`)
pub const WORKGROUP_SIZE: u32 = 16;

/// Uniform block for the diffusion kernel
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DiffusionUniforms {
    pub da: f32,
    pub db: f32,
    pub feed: f32,
    pub kill: f32,
    pub dt: f32,
    pub width: u32,
    pub height: u32,
    pub _padding: u32,
}

impl DiffusionUniforms {
    pub fn new(params: &SimulationParams, width: u32, height: u32) -> Self {
        Self {
            da: params.da,
            db: params.db,
            feed: params.feed,
            kill: params.kill,
            dt: params.dt,
            width,
            height,
            _padding: 0,
        }
    }
}

/// Field backend running the kernel as a wgpu compute pass
pub struct GpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
    uniform_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    readback: Field,
    readback_fresh: bool,
    previous: usize,
}

impl GpuBackend {
    /// Allocate both field buffers, build the kernel and seed the previous slot
    pub fn new(
        context: &GpuContext,
        width: u32,
        height: u32,
        seed: &SeedPattern,
    ) -> Result<Self, SessionError> {
        let device = Arc::clone(&context.device);
        let queue = Arc::clone(&context.queue);

        if width == 0 || height == 0 {
            return Err(SessionError::Config(format!(
                "Field must be at least 1x1, got {}x{}",
                width, height
            )));
        }

        let readback = Field::new(width, height);
        let field_size = readback.byte_len();
        let max_binding = device.limits().max_storage_buffer_binding_size as u64;
        if field_size > max_binding {
            return Err(SessionError::Config(format!(
                "{}x{} field needs {} bytes per buffer, device allows {}",
                width, height, field_size, max_binding
            )));
        }

        let (bind_group_layout, pipeline) = build_pipeline(&device)?;

        let make_field_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: field_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let buffers = [make_field_buffer("Field Buffer 0"), make_field_buffer("Field Buffer 1")];

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Field Staging Buffer"),
            size: field_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = DiffusionUniforms::new(&SimulationParams::default(), width, height);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Diffusion Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let make_bind_group = |src: usize, label| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffers[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers[1 - src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [
            make_bind_group(0, "Diffusion Bind Group 0->1"),
            make_bind_group(1, "Diffusion Bind Group 1->0"),
        ];

        let mut backend = Self {
            device,
            queue,
            pipeline,
            buffers,
            bind_groups,
            uniform_buffer,
            staging_buffer,
            readback,
            readback_fresh: false,
            previous: INITIAL_PREVIOUS,
        };
        backend.reset(seed);

        Ok(backend)
    }

    /// Slot index currently in the next role
    pub fn next_index(&self) -> usize {
        1 - self.previous
    }

    /// Storage buffer of a slot
    pub fn buffer(&self, slot: usize) -> &wgpu::Buffer {
        &self.buffers[slot]
    }

    /// Storage buffer holding the most recently written field
    pub fn next_buffer(&self) -> &wgpu::Buffer {
        &self.buffers[self.next_index()]
    }

    fn dispatch_size(&self) -> (u32, u32) {
        (
            self.readback.width().div_ceil(WORKGROUP_SIZE),
            self.readback.height().div_ceil(WORKGROUP_SIZE),
        )
    }
}

/// Compile the kernel, turning validation failures into `KernelBuild`
fn build_pipeline(
    device: &wgpu::Device,
) -> Result<(wgpu::BindGroupLayout, wgpu::ComputePipeline), SessionError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Diffusion Compute Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("diffusion.wgsl").into()),
    });

    let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Diffusion Bind Group Layout"),
        entries: &[
            storage_entry(0, true),
            storage_entry(1, false),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Diffusion Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Diffusion Compute Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(SessionError::KernelBuild {
            label: "diffusion compute pipeline",
            message: error.to_string(),
        });
    }

    Ok((bind_group_layout, pipeline))
}

impl FieldBackend for GpuBackend {
    fn dimensions(&self) -> (u32, u32) {
        (self.readback.width(), self.readback.height())
    }

    fn step(&mut self, params: &SimulationParams) {
        let (width, height) = self.dimensions();
        let uniforms = DiffusionUniforms::new(params, width, height);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Diffusion Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Diffusion Compute Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_groups[self.previous], &[]);

            let (groups_x, groups_y) = self.dispatch_size();
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        self.queue.submit(Some(encoder.finish()));
        self.readback_fresh = false;
    }

    fn read_next(&mut self) -> Result<&Field, SessionError> {
        if self.readback_fresh {
            return Ok(&self.readback);
        }

        let size = self.readback.byte_len();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(self.next_buffer(), 0, &self.staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver outlives the poll below
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);
        pollster::block_on(receiver)
            .map_err(|_| SessionError::Readback("map callback dropped".to_string()))?
            .map_err(|e| SessionError::Readback(e.to_string()))?;

        {
            let data = buffer_slice.get_mapped_range();
            self.readback
                .cells_mut()
                .copy_from_slice(bytemuck::cast_slice(&data));
        }
        self.staging_buffer.unmap();
        self.readback_fresh = true;

        Ok(&self.readback)
    }

    fn swap(&mut self) {
        self.previous = self.next_index();
        self.readback_fresh = false;
    }

    fn previous_index(&self) -> usize {
        self.previous
    }

    fn reset(&mut self, seed: &SeedPattern) {
        let (width, height) = self.dimensions();
        let seeded = seed.build(width, height);
        let cleared = Field::new(width, height);

        self.previous = INITIAL_PREVIOUS;
        self.queue
            .write_buffer(&self.buffers[self.previous], 0, seeded.as_bytes());
        self.queue
            .write_buffer(&self.buffers[self.next_index()], 0, cleared.as_bytes());
        self.queue.submit(None);
        self.readback_fresh = false;

        debug!("GPU buffers reset to {:?}", seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepper::CpuBackend;

    fn context() -> Option<GpuContext> {
        match pollster::block_on(GpuContext::headless()) {
            Ok(context) => Some(context),
            Err(e) => {
                eprintln!("Skipping GPU test: {}", e);
                None
            }
        }
    }

    #[test]
    fn test_uniforms_fit_uniform_block() {
        assert_eq!(std::mem::size_of::<DiffusionUniforms>(), 32);
    }

    #[test]
    fn test_gpu_matches_cpu_within_tolerance() {
        let Some(context) = context() else {
            return;
        };
        let seed = SeedPattern::default();
        let params = SimulationParams::default();
        let mut gpu = GpuBackend::new(&context, 64, 64, &seed).unwrap();
        let mut cpu = CpuBackend::new(64, 64, &seed);

        for _ in 0..10 {
            gpu.step(&params);
            cpu.step(&params);
            let gpu_field = gpu.read_next().unwrap().clone();
            let cpu_field = cpu.read_next().unwrap();
            for (g, c) in gpu_field.cells().iter().zip(cpu_field.cells()) {
                assert!((g.a - c.a).abs() < 1e-3 && (g.b - c.b).abs() < 1e-3);
            }
            gpu.swap();
            cpu.swap();
        }
        assert_eq!(gpu.previous_index(), cpu.previous_index());
    }

    #[test]
    fn test_gpu_reset_restores_seed() {
        let Some(context) = context() else {
            return;
        };
        let seed = SeedPattern::ring();
        let mut gpu = GpuBackend::new(&context, 32, 32, &seed).unwrap();

        for _ in 0..3 {
            gpu.step(&SimulationParams::default());
            gpu.swap();
        }
        gpu.reset(&seed);
        assert_eq!(gpu.previous_index(), INITIAL_PREVIOUS);

        // With dt = 0 the next field is an exact copy of the seeded previous one
        gpu.step(&SimulationParams {
            dt: 0.0,
            ..Default::default()
        });
        assert_eq!(gpu.read_next().unwrap(), &seed.build(32, 32));
    }
}
