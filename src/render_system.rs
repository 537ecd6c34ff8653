use std::sync::Arc;

use nalgebra::{Point2, Vector4};
use wgpu::{Device, Queue, Surface};

use winit::{dpi::PhysicalSize, window::Window};

use crate::data_types::{push_line, Camera, Camera2d, TileVertex};
use crate::error::RenderError;
use crate::renderer::{GeometryUploader, TileRenderer};
use crate::shader_library::{ShaderBuilder, ShaderLibraryBuilder, TILE_SHADER_SOURCE};
use crate::util::BlockOn;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const VERTEX_STRIDE: u64 = std::mem::size_of::<TileVertex>() as u64;

/// Smallest power-of-two multiple of `current` (or 1) that holds `needed`
/// vertices.
pub fn grown_capacity(current: u64, needed: u64) -> u64 {
    let mut len = current.max(1);
    while len < needed {
        len *= 2;
    }
    len
}

/// GPU vertex buffer owned by a chunk. Capacity is in vertices and only
/// grows; contents are overwritten in place when they fit.
#[derive(Debug, Clone)]
pub struct GpuVertexBuffer {
    buffer: Arc<wgpu::Buffer>,
    capacity: u64,
}

impl GpuVertexBuffer {
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

pub struct RenderState {
    surface: Surface,
    surface_config: wgpu::SurfaceConfiguration,
    device: Device,
    queue: Queue,
    render_pipeline: wgpu::RenderPipeline,

    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    line_vertices: Vec<TileVertex>,
    line_buffer: Option<GpuVertexBuffer>,
    queued: Vec<(Arc<wgpu::Buffer>, u32)>,
    clear_color: wgpu::Color,
}

fn create_depth_texture(device: &Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tile depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl RenderState {
    pub fn init(window: &Window) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(window) };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .block_on()
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    features: wgpu::Features::PUSH_CONSTANTS,
                    limits: wgpu::Limits {
                        max_push_constant_size: Camera::SIZE,
                        ..Default::default()
                    }
                    .using_resolution(adapter.limits()),
                },
                None,
            )
            .block_on()?;

        let mut builder = ShaderLibraryBuilder::new();
        let tile_shader_id = builder.add(ShaderBuilder::embedded("tile.wgsl", TILE_SHADER_SOURCE));
        let shader_library = builder.build(&device)?;
        let tile_shader = shader_library
            .get(tile_shader_id)
            .ok_or(RenderError::MissingShader(tile_shader_id))?
            .clone();

        let (depth_texture, depth_view) = create_depth_texture(&device, size.width, size.height);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tile pipeline layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::VERTEX,
                range: 0..Camera::SIZE,
            }],
        });

        let swapchain_format = surface
            .get_supported_formats(&adapter)
            .first()
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tile pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &tile_shader.handle(),
                entry_point: tile_shader.vertex_entry(),
                buffers: &[TileVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &tile_shader.handle(),
                entry_point: tile_shader.fragment_entry(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: swapchain_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                // equal depth within a layer: later submissions win
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
        };

        surface.configure(&device, &surface_config);
        log::info!(
            "renderer ready on {:?} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            render_pipeline,

            _depth_texture: depth_texture,
            depth_view,

            line_vertices: Vec::new(),
            line_buffer: None,
            queued: Vec::new(),
            clear_color: wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            },
        })
    }

    fn create_vertex_buffer(&self, capacity: u64, bytes: &[u8]) -> GpuVertexBuffer {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tile vertices"),
            size: capacity * VERTEX_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });
        buffer.slice(..).get_mapped_range_mut()[0..bytes.len()].copy_from_slice(bytes);
        buffer.unmap();

        GpuVertexBuffer {
            buffer: Arc::new(buffer),
            capacity,
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
        let (texture, view) =
            create_depth_texture(&self.device, self.surface_config.width, self.surface_config.height);
        self._depth_texture = texture;
        self.depth_view = view;
    }

    /// Draws everything queued since the last call, then debug lines on top,
    /// and presents. Queued draws are consumed even if the frame is skipped.
    pub fn render(&mut self, camera: &Camera2d) {
        let draws = std::mem::take(&mut self.queued);
        let lines = std::mem::take(&mut self.line_vertices);
        let mut line_buffer = self.line_buffer.take();
        if !lines.is_empty() {
            self.upload_vertices(&mut line_buffer, &lines);
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            // Redraw is sometimes sent before resize
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                self.reconfigure();
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring swap chain texture");
                None
            }
            Err(e) => {
                log::error!("failed to acquire next swap chain texture: {}", e);
                None
            }
        };

        if let Some(frame) = frame {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

            {
                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("tile pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: true,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: true,
                        }),
                        stencil_ops: None,
                    }),
                });

                let uniform = camera.to_uniform();
                rpass.set_pipeline(&self.render_pipeline);
                rpass.set_push_constants(
                    wgpu::ShaderStages::VERTEX,
                    0,
                    bytemuck::bytes_of(&uniform),
                );

                for (buffer, count) in &draws {
                    rpass.set_vertex_buffer(0, buffer.slice(..));
                    rpass.draw(0..*count, 0..1);
                }

                if let Some(lines_gpu) = line_buffer.as_ref().filter(|_| !lines.is_empty()) {
                    rpass.set_vertex_buffer(0, lines_gpu.buffer.slice(..));
                    rpass.draw(0..lines.len() as u32, 0..1);
                }
            }

            self.queue.submit(Some(encoder.finish()));
            frame.present();
        }

        // hand the allocations back for the next frame
        self.queued = draws;
        self.queued.clear();
        self.line_vertices = lines;
        self.line_vertices.clear();
        self.line_buffer = line_buffer;
    }

    pub fn resize_if_needed(&mut self, size: &PhysicalSize<u32>, window: &Window) {
        if size.width > 0 && size.height > 0 {
            self.surface_config.width = size.width;
            self.surface_config.height = size.height;
            self.reconfigure();

            window.request_redraw();
        }
    }
}

impl GeometryUploader for RenderState {
    type VertexBuffer = GpuVertexBuffer;

    fn upload_vertices(&mut self, slot: &mut Option<GpuVertexBuffer>, vertices: &[TileVertex]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = vertices.len() as u64;

        if let Some(existing) = slot.as_ref() {
            if existing.capacity >= needed {
                self.queue.write_buffer(&existing.buffer, 0, bytes);
                return;
            }
        }

        let capacity = grown_capacity(slot.as_ref().map_or(0, |b| b.capacity), needed);
        log::trace!("allocating vertex buffer for {} vertices", capacity);
        *slot = Some(self.create_vertex_buffer(capacity, bytes));
    }
}

impl TileRenderer for RenderState {
    fn add_line(
        &mut self,
        start: Point2<f32>,
        end: Point2<f32>,
        thickness: f32,
        color: Vector4<f32>,
        depth: f32,
    ) {
        push_line(&mut self.line_vertices, start, end, thickness, color, depth);
    }

    fn draw_vertex_buffer(&mut self, buffer: &GpuVertexBuffer, vertex_count: u32) {
        if vertex_count > 0 {
            self.queued.push((buffer.buffer.clone(), vertex_count));
        }
    }
}
