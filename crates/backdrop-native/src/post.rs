use crate::helpers::{self, texture_entries, uniform_entry};
use crate::targets::{RenderTargets, Slot, HDR_FORMAT};
use backdrop_core::stages::StageUniforms;
use backdrop_core::{PlannedStage, RenderError, StageContext, StageKind};

// uniform buffer slots, one per pass so every pass keeps its own values
const BRIGHT_SLOT: usize = 0;
const BLUR_H_SLOT: usize = 1;
const BLUR_V_SLOT: usize = 2;
const STAGE_SLOT_BASE: usize = 3;
const PRESENT_SLOT: usize = STAGE_SLOT_BASE + StageKind::ORDER.len();
const SLOT_COUNT: usize = PRESENT_SLOT + 1;

const CLEAR: wgpu::Color = wgpu::Color::BLACK;

/// GPU executor for the composer's plan.
///
/// Each stage gets its own pipeline from the shared stage shader. A stage
/// whose pipeline fails validation is left out and the chain skips it,
/// passing its input through.
pub(crate) struct StagePipelines {
    bgl0: wgpu::BindGroupLayout, // tex+sampler+uniform
    bgl1: wgpu::BindGroupLayout, // tex+sampler
    sampler: wgpu::Sampler,
    uniforms: Vec<wgpu::Buffer>,
    bright: Option<wgpu::RenderPipeline>,
    blur: Option<wgpu::RenderPipeline>,
    stages: Vec<Option<wgpu::RenderPipeline>>,
    present: wgpu::RenderPipeline,
}

impl StagePipelines {
    pub(crate) fn new(device: &wgpu::Device, swap_format: wgpu::TextureFormat) -> Result<Self, RenderError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stages"),
            source: wgpu::ShaderSource::Wgsl(backdrop_core::stages_shader_source().into()),
        });
        let [tex0, samp0] = texture_entries(0);
        let bgl0 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stage_bgl0"),
            entries: &[tex0, samp0, uniform_entry(2, wgpu::ShaderStages::FRAGMENT)],
        });
        let bgl1 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stage_bgl1"),
            entries: &texture_entries(0),
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("stage_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let uniforms = (0..SLOT_COUNT)
            .map(|i| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("stage_uniforms_{i}")),
                    size: std::mem::size_of::<StageUniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();
        let pl_single = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_stage"),
            bind_group_layouts: &[&bgl0],
            push_constant_ranges: &[],
        });
        let pl_composite = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pl_stage_comp"),
            bind_group_layouts: &[&bgl0, &bgl1],
            push_constant_ranges: &[],
        });

        let build = |layout: &wgpu::PipelineLayout, entry: &str, format| {
            helpers::make_checked_pipeline(device, layout, &shader, "vs_fullscreen", entry, format)
        };
        let bright = build(&pl_single, "fs_bright", HDR_FORMAT)
            .map_err(|e| log::warn!("[gpu] bloom bright pass unavailable: {}", e))
            .ok();
        let blur = build(&pl_single, "fs_blur", HDR_FORMAT)
            .map_err(|e| log::warn!("[gpu] bloom blur pass unavailable: {}", e))
            .ok();

        let mut stages = Vec::with_capacity(StageKind::ORDER.len());
        for kind in StageKind::ORDER {
            let layout = if kind == StageKind::Bloom { &pl_composite } else { &pl_single };
            let built = if kind == StageKind::Bloom && (bright.is_none() || blur.is_none()) {
                Err("bright or blur pass missing".to_string())
            } else {
                build(layout, kind.entry_point(), HDR_FORMAT)
            };
            match built {
                Ok(p) => stages.push(Some(p)),
                Err(reason) => {
                    log::warn!("[gpu] {}", RenderError::UnsupportedStage { kind, reason });
                    stages.push(None);
                }
            }
        }
        let present = build(&pl_single, "fs_present", swap_format).map_err(RenderError::Surface)?;

        Ok(Self {
            bgl0,
            bgl1,
            sampler,
            uniforms,
            bright,
            blur,
            stages,
            present,
        })
    }

    pub(crate) fn available(&self, kind: StageKind) -> bool {
        matches!(self.stages.get(kind.order_index()), Some(Some(_)))
    }

    fn source_group(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        slot: usize,
        u: &StageUniforms,
    ) -> wgpu::BindGroup {
        queue.write_buffer(&self.uniforms[slot], 0, bytemuck::bytes_of(u));
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stage_bg0"),
            layout: &self.bgl0,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniforms[slot].as_entire_binding(),
                },
            ],
        })
    }

    /// Bright pass then separable blur; the result lands in `bloom_a`.
    fn encode_bloom(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        source: Slot,
        stage: &PlannedStage,
        ctx: &StageContext,
    ) {
        let (Some(bright), Some(blur)) = (self.bright.as_ref(), self.blur.as_ref()) else {
            return;
        };
        let (bw, bh) = targets.bloom_size();
        let base = stage.uniforms(bw, bh, ctx);
        let bg = self.source_group(device, queue, targets.view(source), BRIGHT_SLOT, &base);
        blit(encoder, "bloom_bright", &targets.bloom_a.view, bright, &bg, None);

        let mut h = base;
        h.params[1] = [1.0 / bw as f32, 0.0, 0.0, 0.0];
        let bg = self.source_group(device, queue, &targets.bloom_a.view, BLUR_H_SLOT, &h);
        blit(encoder, "bloom_blur_h", &targets.bloom_b.view, blur, &bg, None);

        let mut v = base;
        v.params[1] = [0.0, 1.0 / bh as f32, 0.0, 0.0];
        let bg = self.source_group(device, queue, &targets.bloom_b.view, BLUR_V_SLOT, &v);
        blit(encoder, "bloom_blur_v", &targets.bloom_a.view, blur, &bg, None);
    }

    /// Encodes the plan in order over the scene image in `targets.hdr`, then
    /// presents the result to `output`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn encode(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        targets: &RenderTargets,
        plan: &[PlannedStage],
        ctx: &StageContext,
        output: &wgpu::TextureView,
    ) {
        let (w, h) = targets.size();
        let mut current = Slot::Hdr;
        for stage in plan {
            let Some(pipeline) = self.stages.get(stage.kind.order_index()).and_then(Option::as_ref) else {
                continue;
            };
            let out = current.next();
            let slot = STAGE_SLOT_BASE + stage.kind.order_index();
            let u = stage.uniforms(w, h, ctx);
            if stage.kind == StageKind::Bloom {
                self.encode_bloom(device, queue, encoder, targets, current, stage, ctx);
                let bg0 = self.source_group(device, queue, targets.view(current), slot, &u);
                let bg1 = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("stage_bg1"),
                    layout: &self.bgl1,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&targets.bloom_a.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });
                blit(encoder, stage.kind.name(), targets.view(out), pipeline, &bg0, Some(&bg1));
            } else {
                let bg0 = self.source_group(device, queue, targets.view(current), slot, &u);
                blit(encoder, stage.kind.name(), targets.view(out), pipeline, &bg0, None);
            }
            current = out;
        }

        let u = StageUniforms {
            resolution: [w as f32, h as f32],
            time: ctx.time,
            ..Default::default()
        };
        let bg = self.source_group(device, queue, targets.view(current), PRESENT_SLOT, &u);
        blit(encoder, "present", output, &self.present, &bg, None);
    }
}

pub(crate) fn blit(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bg0: &wgpu::BindGroup,
    bg1: Option<&wgpu::BindGroup>,
) {
    let mut r = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    r.set_pipeline(pipeline);
    r.set_bind_group(0, bg0, &[]);
    if let Some(g1) = bg1 {
        r.set_bind_group(1, g1, &[]);
    }
    r.draw(0..3, 0..1);
}
