use crate::constants::LIGHT_DIRECTION;
use glam::Mat4;
use showroom_core::{RenderSettings, SurfaceError};
use web_sys as web;

mod boxes;
mod helpers;

pub use boxes::BoxInstance;
use boxes::{create_box_resources, BoxResources, SceneUniforms, VERTICES_PER_BOX};

/// Everything needed to draw one frame.
pub struct DrawList<'a> {
    pub view_proj: Mat4,
    pub clear: [f32; 3],
    pub instances: &'a [BoxInstance],
    pub settings: RenderSettings,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    boxes: BoxResources,
    width: u32,
    height: u32,
}

impl GpuState {
    /// Build a surface on `canvas`. Any failure maps to [`SurfaceError`] so
    /// the viewport can fall back to its poster.
    pub async fn new(canvas: &web::HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| SurfaceError::ContextUnavailable(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SurfaceError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // WebGL2 fallback cannot meet the default limits
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| SurfaceError::Configure(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| SurfaceError::Configure("no surface formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = helpers::create_depth_view(&device, width, height);
        let boxes = create_box_resources(&device, format);
        log::info!(
            "[gpu] surface {}x{} format {:?} backend {:?}",
            width,
            height,
            format,
            adapter.get_info().backend
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            boxes,
            width,
            height,
        })
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = helpers::create_depth_view(&self.device, width, height);
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render(&mut self, draw: &DrawList) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = SceneUniforms {
            view_proj: draw.view_proj.to_cols_array_2d(),
            light_dir: [
                LIGHT_DIRECTION[0],
                LIGHT_DIRECTION[1],
                LIGHT_DIRECTION[2],
                if draw.settings.shadows { 1.0 } else { 0.0 },
            ],
            params: [
                if draw.settings.contact_shadows { 1.0 } else { 0.0 },
                if draw.settings.post_processing { 1.0 } else { 0.0 },
                self.width as f32,
                self.height as f32,
            ],
        };
        self.queue
            .write_buffer(&self.boxes.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.boxes.ensure_capacity(&self.device, draw.instances.len());
        if !draw.instances.is_empty() {
            self.queue.write_buffer(
                &self.boxes.instance_buffer,
                0,
                bytemuck::cast_slice(draw.instances),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(helpers::clear_color(draw.clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !draw.instances.is_empty() {
                rpass.set_pipeline(&self.boxes.pipeline);
                rpass.set_bind_group(0, &self.boxes.bind_group, &[]);
                rpass.set_vertex_buffer(0, self.boxes.instance_buffer.slice(..));
                rpass.draw(0..VERTICES_PER_BOX, 0..draw.instances.len() as u32);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
