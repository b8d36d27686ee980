//! Rendering system with wgpu surface, display and sweep overlay pipelines.

use bytemuck::{Pod, Zeroable};
use log::warn;
use std::sync::Arc;
use wgpu::util::DeviceExt;

use crate::error::SessionError;
use crate::gpu::{GpuBackend, GpuContext};
use crate::instrument::{FieldBackend, Presenter};
use crate::params::RenderConfig;
use crate::sweep::SweepSegment;

/// Uniform buffer for the display shader (grid and viewport size)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DisplayUniforms {
    pub grid_width: u32,
    pub grid_height: u32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

/// Uniform buffer for the sweep line shader (endpoints in NDC + color)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineUniforms {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub color: [f32; 4],
}

/// Rendering system managing the window surface and presentation pipelines
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    context: GpuContext,
    config: wgpu::SurfaceConfiguration,
    display_pipeline: wgpu::RenderPipeline,
    display_layout: wgpu::BindGroupLayout,
    display_uniform_buffer: wgpu::Buffer,
    /// One bind group per field slot, created by `attach`
    display_bind_groups: Option<[wgpu::BindGroup; 2]>,
    line_pipeline: wgpu::RenderPipeline,
    line_uniform_buffer: wgpu::Buffer,
    line_bind_group: wgpu::BindGroup,
    sweep_color: [f32; 4],
    grid_size: (u32, u32),
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: Arc<winit::window::Window>,
        render_config: &RenderConfig,
    ) -> Result<Self, SessionError> {
        let size = window.inner_size();

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window)?;

        // Request adapter
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                SessionError::GpuUnavailable("Failed to find suitable GPU adapter".to_string())
            })?;

        let context = GpuContext::from_adapter(&adapter).await?;
        let device = &context.device;

        // Concentrations are written as-is, so prefer a linear format
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| SessionError::GpuUnavailable("Surface has no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        // Load shaders
        let display_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("display.wgsl").into()),
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sweep Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sweep_line.wgsl").into()),
        });

        // Display uniforms and bind group layout
        let display_uniforms = DisplayUniforms {
            grid_width: 1,
            grid_height: 1,
            viewport_width: config.width as f32,
            viewport_height: config.height as f32,
        };

        let display_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Display Uniform Buffer"),
            contents: bytemuck::cast_slice(&[display_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let display_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Display Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let display_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Display Pipeline Layout"),
                bind_group_layouts: &[&display_layout],
                push_constant_ranges: &[],
            });

        let display_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&display_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &display_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &display_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Sweep line uniforms and bind group
        let line_uniforms = LineUniforms {
            start: [0.0; 2],
            end: [0.0; 2],
            color: render_config.sweep_color,
        };

        let line_uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sweep Line Uniform Buffer"),
            contents: bytemuck::cast_slice(&[line_uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let line_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sweep Line Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let line_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sweep Line Bind Group"),
            layout: &line_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: line_uniform_buffer.as_entire_binding(),
            }],
        });

        let line_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sweep Line Pipeline Layout"),
            bind_group_layouts: &[&line_layout],
            push_constant_ranges: &[],
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sweep Line Pipeline"),
            layout: Some(&line_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = device.pop_error_scope().await {
            return Err(SessionError::KernelBuild {
                label: "presentation pipelines",
                message: error.to_string(),
            });
        }

        Ok(Self {
            surface,
            context,
            config,
            display_pipeline,
            display_layout,
            display_uniform_buffer,
            display_bind_groups: None,
            line_pipeline,
            line_uniform_buffer,
            line_bind_group,
            sweep_color: render_config.sweep_color,
            grid_size: (1, 1),
        })
    }

    /// Device and queue, shared with the compute backend
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Surface size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Bind both field buffers of `backend` for display
    pub fn attach(&mut self, backend: &GpuBackend) {
        let device = &self.context.device;
        let make_bind_group = |slot: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Display Bind Group"),
                layout: &self.display_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.display_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: backend.buffer(slot).as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [make_bind_group(0), make_bind_group(1)];

        self.display_bind_groups = Some(bind_groups);
        self.grid_size = backend.dimensions();
        self.write_display_uniforms();
    }

    /// Reconfigure the surface after a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.context.device, &self.config);
        self.write_display_uniforms();
    }

    fn write_display_uniforms(&self) {
        let uniforms = DisplayUniforms {
            grid_width: self.grid_size.0,
            grid_height: self.grid_size.1,
            viewport_width: self.config.width as f32,
            viewport_height: self.config.height as f32,
        };
        self.context.queue.write_buffer(
            &self.display_uniform_buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );
    }

    /// Acquire the next surface texture, reconfiguring once if it went stale
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, SessionError> {
        match self.surface.get_current_texture() {
            Ok(output) => Ok(Some(output)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.context.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record one render pass that clears to black and runs `draw`
    fn render_pass(
        &mut self,
        draw: impl FnOnce(&mut wgpu::RenderPass<'_>, &Self),
    ) -> Result<(), SessionError> {
        let Some(output) = self.acquire()? else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            draw(&mut render_pass, self);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Presenter<GpuBackend> for RenderSystem {
    fn present(
        &mut self,
        backend: &mut GpuBackend,
        _frame: u64,
        segment: &SweepSegment,
    ) -> Result<(), SessionError> {
        let (width, height) = self.grid_size;
        let [start, end] = segment.to_clip(width, height);
        let line = LineUniforms {
            start,
            end,
            color: self.sweep_color,
        };
        self.context
            .queue
            .write_buffer(&self.line_uniform_buffer, 0, bytemuck::cast_slice(&[line]));

        let slot = backend.next_index();
        self.render_pass(|pass, this| {
            if let Some(bind_groups) = &this.display_bind_groups {
                // Field as gray
                pass.set_pipeline(&this.display_pipeline);
                pass.set_bind_group(0, &bind_groups[slot], &[]);
                pass.draw(0..3, 0..1); // Fullscreen triangle
            }

            // Sweep overlay
            pass.set_pipeline(&this.line_pipeline);
            pass.set_bind_group(0, &this.line_bind_group, &[]);
            pass.draw(0..2, 0..1);
        })
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.render_pass(|_, _| {})
    }
}
