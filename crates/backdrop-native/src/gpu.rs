use crate::post::StagePipelines;
use crate::targets::{RenderTargets, HDR_FORMAT};
use backdrop_core::{
    ContextLoss, PlannedStage, QualityLevel, RenderError, SceneUniforms, StageContext, StageKind, ViewportGeometry,
};

pub(crate) struct GpuState<'w> {
    pub(crate) window: &'w winit::window::Window,
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    targets: RenderTargets,
    scene_pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bg: wgpu::BindGroup,
    post: StagePipelines,
    quality: Option<QualityLevel>,
    lost: ContextLoss,
}

impl<'w> GpuState<'w> {
    /// `quality` governs the pixel ratio of the offscreen targets, evaluated
    /// against the window's current scale factor on every reconfigure; the
    /// swapchain always matches the window.
    pub(crate) async fn new(window: &'w winit::window::Window, quality: Option<QualityLevel>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await?;
        let lost = ContextLoss::new();
        let oom = lost.clone();
        device.on_uncaptured_error(Box::new(move |e: wgpu::Error| {
            if matches!(e, wgpu::Error::OutOfMemory { .. }) {
                oom.record(format!("out of memory: {e}"));
            } else {
                log::error!("[gpu] uncaptured error: {}", e);
            }
        }));
        let device_lost = lost.clone();
        device.set_device_lost_callback(move |reason: wgpu::DeviceLostReason, message: String| {
            device_lost.record(format!("device lost ({reason:?}): {message}"));
        });

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            desired_maximum_frame_latency: 2,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene"),
            source: wgpu::ShaderSource::Wgsl(backdrop_core::scene_shader_source().into()),
        });
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[crate::helpers::uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_scene"),
            bind_group_layouts: &[&scene_bgl],
            push_constant_ranges: &[],
        });
        let scene_pipeline =
            crate::helpers::make_checked_pipeline(&device, &scene_layout, &scene_shader, "vs_main", "fs_main", HDR_FORMAT)
                .map_err(|e| anyhow::anyhow!("scene pipeline: {}", e))?;

        let post = StagePipelines::new(&device, format)?;
        let unavailable: Vec<&str> = StageKind::ORDER
            .into_iter()
            .filter(|k| !post.available(*k))
            .map(StageKind::name)
            .collect();
        if !unavailable.is_empty() {
            log::warn!("[gpu] passing through unavailable stages: {}", unavailable.join(", "));
        }

        let (rw, rh) = render_size(window, quality, device.limits().max_texture_dimension_2d);
        let targets = RenderTargets::new(&device, rw, rh);
        log::info!(
            "[gpu] surface {}x{} {:?}, render {}x{} at quality {}",
            config.width,
            config.height,
            format,
            rw,
            rh,
            quality.map_or("fallback", QualityLevel::name)
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            targets,
            scene_pipeline,
            scene_buffer,
            scene_bg,
            post,
            quality,
            lost,
        })
    }

    pub(crate) fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub(crate) fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        let (rw, rh) = render_size(self.window, self.quality, self.max_dimension());
        if (rw, rh) != self.targets.size() {
            log::info!("[gpu] render targets {}x{}", rw, rh);
            self.targets.recreate(&self.device, rw, rh);
        }
    }

    pub(crate) fn render(
        &mut self,
        scene: &SceneUniforms,
        plan: &[PlannedStage],
        ctx: &StageContext,
    ) -> Result<(), RenderError> {
        self.lost.check()?;
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::info!("[gpu] surface lost, reconfiguring");
                self.resize(self.window.inner_size());
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(()),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.lost.record("out of memory acquiring surface texture");
                return self.lost.check();
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(scene));
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });
        crate::post::blit(
            &mut encoder,
            "scene",
            &self.targets.hdr.view,
            &self.scene_pipeline,
            &self.scene_bg,
            None,
        );
        self.post
            .encode(&self.device, &self.queue, &mut encoder, &self.targets, plan, ctx, &view);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        self.lost.check()
    }
}

/// Offscreen size for the window's current logical size and scale factor.
fn render_size(window: &winit::window::Window, quality: Option<QualityLevel>, max: u32) -> (u32, u32) {
    let device_dpr = window.scale_factor() as f32;
    let size = window.inner_size();
    ViewportGeometry::new(size.width as f32 / device_dpr, size.height as f32 / device_dpr, device_dpr)
        .render_size(quality, max)
}
