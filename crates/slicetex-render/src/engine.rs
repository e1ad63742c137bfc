//! Offscreen wgpu engine implementing [`RenderBackend`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;
use slicetex_core::{ContextId, DrawCall, Filter, RenderBackend, TextureImage, TextureKey, TextureSize};

use crate::buffer::{aligned_bytes_per_row, create_index_buffer, create_uniform_buffer, create_vertex_buffer};
use crate::error::{RenderError, RenderResult};
use crate::mesh::{expand_to_rgba, mesh_vertices, DrawUniforms, SliceVertex};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Pipeline variants; wgpu bakes blend and write masks into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    textured: bool,
    color_write: bool,
    depth_write: bool,
}

/// A mapper's slice texture on the device.
struct SliceTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: TextureSize,
    filter: Filter,
}

/// Headless renderer drawing slices into an RGBA8 target.
///
/// Each engine is its own rendering context; textures uploaded to one engine
/// are never valid in another.
pub struct SliceRenderEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    context: ContextId,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    white_view: wgpu::TextureView,
    slice_textures: HashMap<TextureKey, SliceTexture>,
    max_texture_size: u32,
    view_projection: Mat4,
    depth_write: bool,
    color_write: bool,
}

impl SliceRenderEngine {
    /// Creates an engine rendering into a `width` x `height` offscreen target.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("slicetex device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let width = width.max(1);
        let height = height.max(1);
        let (color_texture, color_view) = Self::create_color_target(&device, width, height);
        let depth_view = Self::create_depth_target(&device, width, height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Image Slice Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/image_slice.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Image Slice Bind Group Layout"),
            entries: &[
                // Draw uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Slice texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Image Slice Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let nearest_sampler = Self::create_sampler(&device, wgpu::FilterMode::Nearest);
        let linear_sampler = Self::create_sampler(&device, wgpu::FilterMode::Linear);
        let white_view = Self::create_white_texture(&device, &queue);
        let max_texture_size = device.limits().max_texture_dimension_2d;

        log::debug!("created {width}x{height} headless slice engine (max texture {max_texture_size})");

        Ok(Self {
            device,
            queue,
            width,
            height,
            context: ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)),
            color_texture,
            color_view,
            depth_view,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            nearest_sampler,
            linear_sampler,
            white_view,
            slice_textures: HashMap::new(),
            max_texture_size,
            view_projection: Mat4::IDENTITY,
            depth_write: true,
            color_write: true,
        })
    }

    fn create_color_target(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Slice Color Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Slice Depth Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_sampler(device: &wgpu::Device, filter: wgpu::FilterMode) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Slice Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        })
    }

    /// 1x1 white texture bound for untextured draws.
    fn create_white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
        let texture = Self::create_slice_texture(device, 1, 1);
        Self::write_slice_texture(queue, &texture, &[255, 255, 255, 255], 1, 1);
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_slice_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Slice Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_slice_texture(queue: &wgpu::Queue, texture: &wgpu::Texture, rgba: &[u8], width: u32, height: u32) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        let device = &self.device;
        let shader = &self.shader;
        let pipeline_layout = &self.pipeline_layout;
        self.pipelines.entry(key).or_insert_with(|| {
            log::debug!("creating slice pipeline {key:?}");
            let blend = if key.textured {
                wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::SrcAlpha,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                }
            } else {
                wgpu::BlendState::REPLACE
            };

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Image Slice Pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[SliceVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(blend),
                        write_mask: if key.color_write {
                            wgpu::ColorWrites::ALL
                        } else {
                            wgpu::ColorWrites::empty()
                        },
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None, // Slices are visible from both sides
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: key.depth_write,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        });
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Sets the matrix applied after each draw's data-to-world matrix.
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Lowers the texture edge limit reported to mappers (never above the device limit).
    pub fn set_max_texture_size(&mut self, size: u32) {
        self.max_texture_size = size.clamp(1, self.device.limits().max_texture_dimension_2d);
    }

    /// Size of the texture held under `key`, if any.
    pub fn texture_size(&self, key: TextureKey) -> Option<TextureSize> {
        self.slice_textures.get(&key).map(|t| t.size)
    }

    /// Number of slice textures held.
    pub fn texture_count(&self) -> usize {
        self.slice_textures.len()
    }

    /// Clears the color target to `clear` and the depth target to the far plane.
    pub fn begin_frame(&mut self, clear: [f64; 4]) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("slice clear encoder"),
        });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Slice Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Waits for all submitted work to finish.
    pub fn end_frame(&self) {
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
    }

    /// Reads back the color target as tightly packed RGBA rows, top row first.
    pub fn read_pixels(&self) -> RenderResult<Vec<u8>> {
        let bytes_per_row = aligned_bytes_per_row(self.width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("slice readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("slice readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        // Copy data, removing row padding
        let data = buffer_slice.get_mapped_range();
        let row_bytes = (self.width * 4) as usize;
        let mut result = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            result.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        buffer.unmap();

        Ok(result)
    }

    fn upload(&mut self, key: TextureKey, image: &TextureImage) -> RenderResult<()> {
        let TextureSize { width, height } = image.size;
        if width == 0 || height == 0 {
            return Err(RenderError::TextureCreationFailed(format!("empty {width}x{height} texture")));
        }
        let limit = self.device.limits().max_texture_dimension_2d as usize;
        if width > limit || height > limit {
            return Err(RenderError::TextureCreationFailed(format!(
                "{width}x{height} exceeds the device limit of {limit}"
            )));
        }
        let rgba = expand_to_rgba(&image.pixels, image.bytes_per_pixel).ok_or_else(|| {
            RenderError::TextureCreationFailed(format!("{} bytes per pixel", image.bytes_per_pixel))
        })?;
        if rgba.len() != width * height * 4 {
            return Err(RenderError::TextureCreationFailed(format!(
                "{} pixels for a {width}x{height} texture",
                rgba.len() / 4
            )));
        }

        let (w, h) = (width as u32, height as u32);
        let current = self
            .slice_textures
            .get_mut(&key)
            .filter(|t| image.reuse_texture && t.size == image.size);
        if let Some(current) = current {
            Self::write_slice_texture(&self.queue, &current.texture, &rgba, w, h);
            current.filter = image.filter;
        } else {
            let texture = Self::create_slice_texture(&self.device, w, h);
            Self::write_slice_texture(&self.queue, &texture, &rgba, w, h);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.slice_textures.insert(
                key,
                SliceTexture {
                    texture,
                    view,
                    size: image.size,
                    filter: image.filter,
                },
            );
        }
        Ok(())
    }

    fn draw_mesh(&mut self, call: &DrawCall<'_>) -> RenderResult<()> {
        let mesh = call.mesh;
        if mesh.is_empty() {
            return Ok(());
        }
        let vertex_count = mesh.points().len();
        if mesh.triangles().iter().flatten().any(|&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidMesh(format!(
                "triangle index out of range for {vertex_count} points"
            )));
        }

        let key = PipelineKey {
            textured: call.textured(),
            color_write: self.color_write,
            depth_write: self.depth_write,
        };
        self.ensure_pipeline(key);

        let (texture_view, sampler) = if let Some(texture_key) = call.texture {
            let texture = self
                .slice_textures
                .get(&texture_key)
                .ok_or(RenderError::MissingTexture)?;
            let sampler = match texture.filter {
                Filter::Nearest => &self.nearest_sampler,
                Filter::Linear => &self.linear_sampler,
            };
            (&texture.view, sampler)
        } else {
            (&self.white_view, &self.linear_sampler)
        };

        let uniforms = DrawUniforms::new(self.view_projection, call.model, &call.material, call.textured());
        let uniform_buffer = create_uniform_buffer(&self.device, &uniforms, Some("slice draw uniforms"));
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Image Slice Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let vertex_buffer = create_vertex_buffer(&self.device, &mesh_vertices(mesh), Some("slice vertices"));
        let index_buffer = create_index_buffer(&self.device, mesh.triangles(), Some("slice indices"));
        let index_count = (mesh.triangles().len() * 3) as u32;

        let pipeline = &self.pipelines[&key];

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("slice draw encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Image Slice Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load, // Preserve existing content
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl RenderBackend for SliceRenderEngine {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn context_generation(&self) -> u64 {
        0
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn upload_texture(&mut self, key: TextureKey, texture: TextureImage) -> slicetex_core::Result<()> {
        Ok(self.upload(key, &texture)?)
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> slicetex_core::Result<()> {
        Ok(self.draw_mesh(call)?)
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_color_write(&mut self, enabled: bool) {
        self.color_write = enabled;
    }

    fn release(&mut self, key: TextureKey) {
        if self.slice_textures.remove(&key).is_some() {
            log::debug!("released slice texture {key:?}");
        }
    }
}
