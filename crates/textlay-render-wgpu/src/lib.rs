use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use std::panic::{AssertUnwindSafe, catch_unwind};
use textlay_core::{RenderBackend, Scene, SceneNode};
use textlay_text::GlyphKey;

mod atlas;

use atlas::ShelfPacker;

const ATLAS_SIZE: u32 = 2048;

struct UploadRing {
    buf: wgpu::Buffer,
    cap: u64,
    head: u64,
}

impl UploadRing {
    fn new(device: &wgpu::Device, label: &str, cap: u64) -> Self {
        let buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: cap,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buf, cap, head: 0 }
    }
    fn reset(&mut self) {
        self.head = 0;
    }
    /// Returns the offset and the number of bytes actually written; writes
    /// that don't fit are truncated to the ring's capacity.
    fn alloc_write(&mut self, queue: &wgpu::Queue, bytes: &[u8]) -> (u64, u64) {
        let len = bytes.len() as u64;
        let align = 4u64; // vertex buffer slice offset alignment
        let start = (self.head + (align - 1)) & !(align - 1);
        let end = start + len;
        if end > self.cap {
            // wrap and overwrite from start
            let len = len.min(self.cap);
            queue.write_buffer(&self.buf, 0, &bytes[0..len as usize]);
            self.head = len;
            (0, len)
        } else {
            queue.write_buffer(&self.buf, start, bytes);
            self.head = end;
            (start, len)
        }
    }
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    rect_pipeline: wgpu::RenderPipeline,
    border_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    atlas_bind: wgpu::BindGroup,

    atlas: AtlasA8,

    // per-frame upload rings
    ring_rect: UploadRing,
    ring_border: UploadRing,
    ring_glyph: UploadRing,
}

struct AtlasA8 {
    tex: wgpu::Texture,
    packer: ShelfPacker,
    map: HashMap<GlyphKey, GlyphInfo>,
    // set when an upload didn't fit; the atlas is wiped before the next frame
    overflowed: bool,
}

#[derive(Clone, Copy)]
struct GlyphInfo {
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
    w: f32,
    h: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct RectInstance {
    // xy in NDC, wh in NDC extents
    xywh: [f32; 4],
    // radius in NDC units
    radius: f32,
    // rgba (linear)
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BorderInstance {
    xywh: [f32; 4],
    radius_outer: f32,
    stroke: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GlyphInstance {
    xywh: [f32; 4],
    uv: [f32; 4],
    color: [f32; 4],
}

fn instance_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    stride: u64,
    attributes: &[wgpu::VertexAttribute],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: stride,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

impl WgpuBackend {
    pub fn new(window: Arc<winit::window::Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|_e| anyhow::anyhow!("No adapter"))?;

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: Some("textlay device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            }))?;

        let size = window.inner_size();

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let present_mode = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::PresentMode::Mailbox)
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "surface {}x{} {:?} {:?}",
            config.width,
            config.height,
            format,
            present_mode
        );

        let plain_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let rect_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rect.wgsl"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/rect.wgsl"))),
        });
        let rect_pipeline = instance_pipeline(
            &device,
            "rect pipeline",
            &rect_shader,
            &plain_layout,
            std::mem::size_of::<RectInstance>() as u64,
            &[
                // xywh
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // radius
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 16,
                    format: wgpu::VertexFormat::Float32,
                },
                // color
                wgpu::VertexAttribute {
                    shader_location: 2,
                    offset: 20,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
            config.format,
        );

        let border_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("border.wgsl"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/border.wgsl"))),
        });
        let border_pipeline = instance_pipeline(
            &device,
            "border pipeline",
            &border_shader,
            &plain_layout,
            std::mem::size_of::<BorderInstance>() as u64,
            &[
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 16,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    shader_location: 2,
                    offset: 20,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    shader_location: 3,
                    offset: 24,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
            config.format,
        );

        let text_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("text.wgsl"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/text.wgsl"))),
        });
        let text_bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("text bind layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let text_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("text pipeline layout"),
            bind_group_layouts: &[&text_bind_layout],
            immediate_size: 0,
        });
        let text_pipeline = instance_pipeline(
            &device,
            "text pipeline (mask)",
            &text_shader,
            &text_pipeline_layout,
            std::mem::size_of::<GlyphInstance>() as u64,
            &[
                wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 16,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    shader_location: 2,
                    offset: 32,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
            config.format,
        );

        let atlas_size = ATLAS_SIZE.min(device.limits().max_texture_dimension_2d);
        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glyph atlas A8"),
            size: wgpu::Extent3d {
                width: atlas_size,
                height: atlas_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph atlas sampler A8"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let atlas_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas bind"),
            layout: &text_bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let ring_rect = UploadRing::new(&device, "ring rect", 1 << 18);
        let ring_border = UploadRing::new(&device, "ring border", 1 << 18);
        let ring_glyph = UploadRing::new(&device, "ring glyph", 1 << 20);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            rect_pipeline,
            border_pipeline,
            text_pipeline,
            atlas_bind,
            atlas: AtlasA8 {
                tex,
                packer: ShelfPacker::new(atlas_size),
                map: HashMap::new(),
                overflowed: false,
            },
            ring_rect,
            ring_border,
            ring_glyph,
        })
    }

    fn upload_glyph(&mut self, key: GlyphKey) -> Option<GlyphInfo> {
        if let Some(info) = self.atlas.map.get(&key) {
            return Some(*info);
        }

        let gb = textlay_text::rasterize(key)?;
        if gb.w == 0 || gb.h == 0 || gb.data.is_empty() {
            return None;
        }
        if !matches!(gb.content, cosmic_text::SwashContent::Mask) {
            log::debug!("skipping non-mask glyph {:?}", gb.content);
            return None;
        }

        let Some((x, y)) = self.atlas.packer.alloc(gb.w, gb.h) else {
            if !self.atlas.overflowed {
                log::warn!("glyph atlas full; flushing before next frame");
            }
            self.atlas.overflowed = true;
            return None;
        };

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfoBase {
                texture: &self.atlas.tex,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &gb.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(gb.w),
                rows_per_image: Some(gb.h),
            },
            wgpu::Extent3d {
                width: gb.w,
                height: gb.h,
                depth_or_array_layers: 1,
            },
        );

        let size = self.atlas.packer.size as f32;
        let info = GlyphInfo {
            u0: x as f32 / size,
            v0: y as f32 / size,
            u1: (x + gb.w) as f32 / size,
            v1: (y + gb.h) as f32 / size,
            w: gb.w as f32,
            h: gb.h as f32,
        };
        self.atlas.map.insert(key, info);
        Some(info)
    }
}

/// Pixel rect -> NDC `[min_x, min_y, w, h]` (y up).
fn to_ndc(x: f32, y: f32, w: f32, h: f32, fb_w: f32, fb_h: f32) -> [f32; 4] {
    let x0 = (x / fb_w) * 2.0 - 1.0;
    let y0 = 1.0 - (y / fb_h) * 2.0;
    let x1 = ((x + w) / fb_w) * 2.0 - 1.0;
    let y1 = 1.0 - ((y + h) / fb_h) * 2.0;
    [x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs()]
}

/// Pixel length -> NDC, using the tighter axis.
fn to_ndc_len(px: f32, fb_w: f32, fb_h: f32) -> f32 {
    ((px / fb_w) * 2.0).min((px / fb_h) * 2.0)
}

impl RenderBackend for WgpuBackend {
    fn configure_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn frame(&mut self, scene: &Scene) {
        if self.config.width == 0 || self.config.height == 0 {
            return;
        }
        let frame = loop {
            match self.surface.get_current_texture() {
                Ok(f) => break f,
                Err(wgpu::SurfaceError::Lost) => {
                    log::warn!("surface lost; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                }
                Err(wgpu::SurfaceError::Outdated) => {
                    log::warn!("surface outdated; reconfiguring");
                    self.surface.configure(&self.device, &self.config);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!("surface timeout; skipping frame");
                    return;
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("surface OOM");
                    return;
                }
                Err(wgpu::SurfaceError::Other) => {
                    log::error!("surface error");
                    return;
                }
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if self.atlas.overflowed {
            self.atlas.map.clear();
            self.atlas.packer.reset();
            self.atlas.overflowed = false;
            textlay_text::trim_caches();
        }

        let fb_w = self.config.width as f32;
        let fb_h = self.config.height as f32;

        // Paint order is preserved by flushing a batch whenever the node kind
        // changes.
        enum Cmd {
            Rect { off: u64, cnt: u32 },
            Border { off: u64, cnt: u32 },
            Glyphs { off: u64, cnt: u32 },
        }
        enum Pending {
            Rects(Vec<RectInstance>),
            Borders(Vec<BorderInstance>),
            Glyphs(Vec<GlyphInstance>),
        }

        self.ring_rect.reset();
        self.ring_border.reset();
        self.ring_glyph.reset();

        let mut cmds: Vec<Cmd> = Vec::with_capacity(scene.nodes.len());
        let mut flush = |pending: Pending,
                         rings: (&mut UploadRing, &mut UploadRing, &mut UploadRing),
                         queue: &wgpu::Queue| {
            let (ring_rect, ring_border, ring_glyph) = rings;
            match pending {
                Pending::Rects(v) if !v.is_empty() => {
                    let (off, wrote) = ring_rect.alloc_write(queue, bytemuck::cast_slice(&v));
                    let cnt = (wrote / std::mem::size_of::<RectInstance>() as u64) as u32;
                    cmds.push(Cmd::Rect { off, cnt });
                }
                Pending::Borders(v) if !v.is_empty() => {
                    let (off, wrote) = ring_border.alloc_write(queue, bytemuck::cast_slice(&v));
                    let cnt = (wrote / std::mem::size_of::<BorderInstance>() as u64) as u32;
                    cmds.push(Cmd::Border { off, cnt });
                }
                Pending::Glyphs(v) if !v.is_empty() => {
                    let (off, wrote) = ring_glyph.alloc_write(queue, bytemuck::cast_slice(&v));
                    let cnt = (wrote / std::mem::size_of::<GlyphInstance>() as u64) as u32;
                    cmds.push(Cmd::Glyphs { off, cnt });
                }
                _ => {}
            }
        };

        let mut pending = Pending::Rects(Vec::new());
        for node in &scene.nodes {
            match node {
                SceneNode::Rect {
                    rect,
                    color,
                    radius,
                } => {
                    let inst = RectInstance {
                        xywh: to_ndc(rect.x, rect.y, rect.w, rect.h, fb_w, fb_h),
                        radius: to_ndc_len(*radius, fb_w, fb_h),
                        color: color.to_linear(),
                    };
                    match &mut pending {
                        Pending::Rects(v) => v.push(inst),
                        _ => {
                            let done = std::mem::replace(&mut pending, Pending::Rects(vec![inst]));
                            flush(
                                done,
                                (&mut self.ring_rect, &mut self.ring_border, &mut self.ring_glyph),
                                &self.queue,
                            );
                        }
                    }
                }
                SceneNode::Border {
                    rect,
                    color,
                    width,
                    radius,
                } => {
                    let inst = BorderInstance {
                        xywh: to_ndc(rect.x, rect.y, rect.w, rect.h, fb_w, fb_h),
                        radius_outer: to_ndc_len(*radius, fb_w, fb_h),
                        stroke: to_ndc_len(*width, fb_w, fb_h),
                        color: color.to_linear(),
                    };
                    match &mut pending {
                        Pending::Borders(v) => v.push(inst),
                        _ => {
                            let done =
                                std::mem::replace(&mut pending, Pending::Borders(vec![inst]));
                            flush(
                                done,
                                (&mut self.ring_rect, &mut self.ring_border, &mut self.ring_glyph),
                                &self.queue,
                            );
                        }
                    }
                }
                SceneNode::Text {
                    origin,
                    text,
                    color,
                    size,
                } => {
                    if *size <= 0.0 {
                        continue;
                    }
                    let mut glyphs = Vec::new();
                    for sg in textlay_text::shape_line(text, *size) {
                        if let Some(info) = self.upload_glyph(sg.key) {
                            glyphs.push(GlyphInstance {
                                xywh: to_ndc(
                                    origin.x + sg.x,
                                    origin.y + sg.y,
                                    info.w,
                                    info.h,
                                    fb_w,
                                    fb_h,
                                ),
                                uv: [info.u0, info.v1, info.u1, info.v0],
                                color: color.to_linear(),
                            });
                        }
                    }
                    match &mut pending {
                        Pending::Glyphs(v) => v.extend(glyphs),
                        _ => {
                            let done = std::mem::replace(&mut pending, Pending::Glyphs(glyphs));
                            flush(
                                done,
                                (&mut self.ring_rect, &mut self.ring_border, &mut self.ring_glyph),
                                &self.queue,
                            );
                        }
                    }
                }
            }
        }
        flush(
            pending,
            (&mut self.ring_rect, &mut self.ring_border, &mut self.ring_glyph),
            &self.queue,
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: scene.clear_color.0 as f64 / 255.0,
                            g: scene.clear_color.1 as f64 / 255.0,
                            b: scene.clear_color.2 as f64 / 255.0,
                            a: scene.clear_color.3 as f64 / 255.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for cmd in cmds {
                match cmd {
                    Cmd::Rect { off, cnt } => {
                        rpass.set_pipeline(&self.rect_pipeline);
                        let bytes = (cnt as u64) * std::mem::size_of::<RectInstance>() as u64;
                        rpass.set_vertex_buffer(0, self.ring_rect.buf.slice(off..off + bytes));
                        rpass.draw(0..6, 0..cnt);
                    }
                    Cmd::Border { off, cnt } => {
                        rpass.set_pipeline(&self.border_pipeline);
                        let bytes = (cnt as u64) * std::mem::size_of::<BorderInstance>() as u64;
                        rpass.set_vertex_buffer(0, self.ring_border.buf.slice(off..off + bytes));
                        rpass.draw(0..6, 0..cnt);
                    }
                    Cmd::Glyphs { off, cnt } => {
                        rpass.set_pipeline(&self.text_pipeline);
                        rpass.set_bind_group(0, &self.atlas_bind, &[]);
                        let bytes = (cnt as u64) * std::mem::size_of::<GlyphInstance>() as u64;
                        rpass.set_vertex_buffer(0, self.ring_glyph.buf.slice(off..off + bytes));
                        rpass.draw(0..6, 0..cnt);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Err(e) = catch_unwind(AssertUnwindSafe(|| frame.present())) {
            log::warn!("frame.present panicked: {:?}", e);
        }
    }
}
