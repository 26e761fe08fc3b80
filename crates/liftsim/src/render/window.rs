use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use wgpu::util::DeviceExt;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use super::scene::{DrawCommand, Rgb, Scene};
use super::{Frame, Point, Rect, Renderer, CANVAS_HEIGHT, CANVAS_WIDTH, TITLE};

/// Canvas pixels per font pixel
const TEXT_SCALE: f64 = 2.0;
const GLYPH_ADVANCE: f64 = 7.0 * TEXT_SCALE;
const CIRCLE_SEGMENTS: usize = 24;
const INITIAL_VERTEX_CAPACITY: u64 = 16 * 1024;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Triangle list in clip space for one scene
#[derive(Debug)]
struct Mesh {
    width: f64,
    height: f64,
    vertices: Vec<Vertex>,
}

impl Mesh {
    fn from_scene(scene: &Scene) -> Self {
        let mut mesh = Self {
            width: scene.width,
            height: scene.height,
            vertices: Vec::new(),
        };
        for command in &scene.commands {
            mesh.push(command);
        }
        mesh
    }

    fn push(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::FillRect { rect, color } => self.quad(*rect, *color),
            DrawCommand::StrokeRect { rect, width, color } => {
                let Rect { x, y, w, h } = *rect;
                let t = *width;
                self.quad(Rect { x, y, w, h: t }, *color);
                self.quad(Rect { x, y: y + h - t, w, h: t }, *color);
                self.quad(Rect { x, y, w: t, h }, *color);
                self.quad(Rect { x: x + w - t, y, w: t, h }, *color);
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => self.line(*from, *to, *width, *color),
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => self.circle(*center, *radius, *color),
            DrawCommand::Text {
                origin,
                text,
                color,
            } => self.text(*origin, text, *color),
        }
    }

    // canvas y grows downwards, clip space y upwards
    fn vertex(&self, p: Point, color: Rgb) -> Vertex {
        Vertex {
            position: [
                (p.x / self.width * 2.0 - 1.0) as f32,
                (1.0 - p.y / self.height * 2.0) as f32,
            ],
            color,
        }
    }

    fn triangle(&mut self, a: Point, b: Point, c: Point, color: Rgb) {
        for p in [a, b, c] {
            let v = self.vertex(p, color);
            self.vertices.push(v);
        }
    }

    fn quad(&mut self, rect: Rect, color: Rgb) {
        let tl = Point { x: rect.x, y: rect.y };
        let tr = Point {
            x: rect.x + rect.w,
            y: rect.y,
        };
        let bl = Point {
            x: rect.x,
            y: rect.y + rect.h,
        };
        let br = Point {
            x: rect.x + rect.w,
            y: rect.y + rect.h,
        };
        self.triangle(tl, tr, br, color);
        self.triangle(tl, br, bl, color);
    }

    fn line(&mut self, from: Point, to: Point, width: f64, color: Rgb) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let len = dx.hypot(dy);
        if len == 0.0 {
            return;
        }
        let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
        let a = Point {
            x: from.x + nx,
            y: from.y + ny,
        };
        let b = Point {
            x: from.x - nx,
            y: from.y - ny,
        };
        let c = Point {
            x: to.x - nx,
            y: to.y - ny,
        };
        let d = Point {
            x: to.x + nx,
            y: to.y + ny,
        };
        self.triangle(a, b, c, color);
        self.triangle(a, c, d, color);
    }

    fn circle(&mut self, center: Point, radius: f64, color: Rgb) {
        let rim = |i: usize| {
            let angle = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            Point {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        };
        for i in 0..CIRCLE_SEGMENTS {
            self.triangle(center, rim(i), rim(i + 1), color);
        }
    }

    /// 8x8 bitmap glyphs; characters outside the basic set leave a gap
    fn text(&mut self, origin: Point, text: &str, color: Rgb) {
        let mut x = origin.x;
        for ch in text.chars() {
            if let Some(glyph) = BASIC_FONTS.get(ch) {
                for (row, bits) in glyph.iter().enumerate() {
                    for col in 0..8u8 {
                        if bits & (1u8 << col) != 0 {
                            let cell = Rect {
                                x: x + f64::from(col) * TEXT_SCALE,
                                y: origin.y + row as f64 * TEXT_SCALE,
                                w: TEXT_SCALE,
                                h: TEXT_SCALE,
                            };
                            self.quad(cell, color);
                        }
                    }
                }
            }
            x += GLYPH_ADVANCE;
        }
    }
}

/// Desktop window drawn with wgpu; closing the window ends the run
pub struct WindowRenderer {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    closed: bool,
}

impl WindowRenderer {
    /// Open the window and set up the GPU pipeline; must run on the main thread
    pub async fn new() -> Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create the event loop")?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(TITLE)
                .with_inner_size(LogicalSize::new(CANVAS_WIDTH, CANVAS_HEIGHT))
                .build(&event_loop)
                .context("Failed to create the window")?,
        );

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create the window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter can draw to the window")?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("liftsim device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .context("Failed to request a graphics device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("Window surface reports no texture formats")?;
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shape shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shape.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape pipeline layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shape pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shape vertices"),
            size: INITIAL_VERTEX_CAPACITY * std::mem::size_of::<Vertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::info!(
            adapter = %adapter.get_info().name,
            ?format,
            width = config.width,
            height = config.height,
            "window opened"
        );

        Ok(Self {
            event_loop,
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            closed: false,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width > 0 && size.height > 0 {
            self.config.width = size.width;
            self.config.height = size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn upload(&mut self, vertices: &[Vertex]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        if self.vertex_buffer.size() < bytes.len() as u64 {
            self.vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("shape vertices"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
        } else {
            self.queue.write_buffer(&self.vertex_buffer, 0, bytes);
        }
    }
}

impl Renderer for WindowRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let scene = Scene::from_frame(frame);
        let mesh = Mesh::from_scene(&scene);
        let count = u32::try_from(mesh.vertices.len()).context("Frame has too many vertices")?;
        self.upload(&mesh.vertices);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!(tick = frame.tick, "surface timed out, frame skipped");
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire the next frame"),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let [r, g, b] = scene.background;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(r),
                            g: f64::from(g),
                            b: f64::from(b),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..count, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(true);
        }
        let mut close = false;
        let mut resized = None;
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, elwt| {
                if let Event::WindowEvent { event, .. } = event {
                    match event {
                        WindowEvent::CloseRequested => {
                            close = true;
                            elwt.exit();
                        }
                        WindowEvent::Resized(size) => resized = Some(size),
                        _ => {}
                    }
                }
            });
        if let Some(size) = resized {
            self.resize(size);
        }
        Ok(close || matches!(status, PumpStatus::Exit(_)))
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.window.set_visible(false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scene::{BLACK, BLUE, RED};
    use crate::stats::RunStats;
    use approx::assert_relative_eq;
    use lift_rl_core::{Building, Dispatch, ElevatorState, Reward, TdUpdate};

    fn canvas(commands: Vec<DrawCommand>) -> Scene {
        Scene {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            background: [1.0, 1.0, 1.0],
            commands,
        }
    }

    #[test]
    fn test_full_canvas_rect_covers_clip_space() {
        let mesh = Mesh::from_scene(&canvas(vec![DrawCommand::FillRect {
            rect: Rect {
                x: 0.0,
                y: 0.0,
                w: CANVAS_WIDTH,
                h: CANVAS_HEIGHT,
            },
            color: BLUE,
        }]));
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.vertices[0].position, [-1.0, 1.0]);
        assert_eq!(mesh.vertices[2].position, [1.0, -1.0]);
        assert!(mesh.vertices.iter().all(|v| v.color == BLUE));
    }

    #[test]
    fn test_stroke_is_four_bars() {
        let mesh = Mesh::from_scene(&canvas(vec![DrawCommand::StrokeRect {
            rect: Rect {
                x: 300.0,
                y: 50.0,
                w: 200.0,
                h: 550.0,
            },
            width: 2.0,
            color: BLACK,
        }]));
        assert_eq!(mesh.vertices.len(), 24);
    }

    #[test]
    fn test_circle_stays_within_radius() {
        let center = Point { x: 400.0, y: 300.0 };
        let mesh = Mesh::from_scene(&canvas(vec![DrawCommand::Circle {
            center,
            radius: 10.0,
            color: RED,
        }]));
        assert_eq!(mesh.vertices.len(), 3 * CIRCLE_SEGMENTS);
        for v in &mesh.vertices {
            let x = (f64::from(v.position[0]) + 1.0) / 2.0 * CANVAS_WIDTH;
            let y = (1.0 - f64::from(v.position[1])) / 2.0 * CANVAS_HEIGHT;
            assert!((x - center.x).hypot(y - center.y) <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn test_text_uses_one_quad_per_lit_pixel() {
        let glyph = BASIC_FONTS.get('7').unwrap();
        let lit: u32 = glyph.iter().map(|row| row.count_ones()).sum();
        let mesh = Mesh::from_scene(&canvas(vec![DrawCommand::Text {
            origin: Point { x: 20.0, y: 20.0 },
            text: "7".into(),
            color: BLACK,
        }]));
        assert_eq!(mesh.vertices.len(), 6 * lit as usize);

        let blank = Mesh::from_scene(&canvas(vec![DrawCommand::Text {
            origin: Point { x: 20.0, y: 20.0 },
            text: " ".into(),
            color: BLACK,
        }]));
        assert!(blank.vertices.is_empty());
    }

    #[test]
    fn test_horizontal_line_has_requested_thickness() {
        let mesh = Mesh::from_scene(&canvas(vec![DrawCommand::Line {
            from: Point { x: 300.0, y: 100.0 },
            to: Point { x: 500.0, y: 100.0 },
            width: 2.0,
            color: BLACK,
        }]));
        assert_eq!(mesh.vertices.len(), 6);
        let ys: Vec<f64> = mesh
            .vertices
            .iter()
            .map(|v| (1.0 - f64::from(v.position[1])) / 2.0 * CANVAS_HEIGHT)
            .collect();
        let top = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let bottom = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(bottom - top, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_frame_mesh_fits_clip_space() {
        let stats = RunStats::default();
        let frame = Frame {
            tick: 1,
            building: Building::default(),
            state: ElevatorState {
                current_floor: 0,
                target_floor: 9,
                passengers: 7,
            },
            action: Dispatch::Move,
            reward: Reward(-12.5),
            update: TdUpdate {
                value: 0.4,
                next_value: 0.3,
                td_error: -12.6,
                move_probability: 0.9,
                gradient: 0.1,
            },
            stats: &stats,
        };
        let mesh = Mesh::from_scene(&Scene::from_frame(&frame));
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.vertices.len() % 3, 0);
        for v in &mesh.vertices {
            assert!(v.position[0].abs() <= 1.0 + 1e-4, "{:?}", v.position);
            assert!(v.position[1].abs() <= 1.0 + 1e-4, "{:?}", v.position);
        }
        assert!(mesh.vertices.iter().any(|v| v.color == BLUE));
        assert!(mesh.vertices.iter().any(|v| v.color == RED));
    }
}
