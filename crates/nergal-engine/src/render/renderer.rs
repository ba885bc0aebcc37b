use std::collections::HashMap;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::assets::{CacheError, ProgramId, ShaderCache, ShaderProgram};
use crate::paint::Color;

use super::common::{sampler_entry, texture_entry, triangle_list, uniform_entry};
use super::ctx::{PassInfo, RenderCtx, RenderTarget};
use super::effect::{insert_or_push, Effect, EffectUniform};
use super::framebuffer::{DepthBuffer, FrameBuffer, DEPTH_FORMAT};
use super::globals::{CameraUniform, FrameGlobals, Light};
use super::group::{groups_for_stage, MeshGroup, RenderStage};
use super::plan::{plan_frame, Pass, SceneTarget, Slot};
use super::shaders::{register_builtin_shaders, FX_COMPOSITE, FX_VERTEX};

/// Byte stride between effect parameter blocks in the shared uniform buffer.
///
/// Matches the default `min_uniform_buffer_offset_alignment`.
const EFFECT_UNIFORM_STRIDE: u64 = 256;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Route the scene through the effect chain and composite pass.
    pub effects_enabled: bool,
    /// Side length of the square effect framebuffers.
    pub framebuffer_size: u32,
    pub clear_color: Color,
    /// Weight of the untouched scene added on top of the effect output.
    pub composite_scale: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            effects_enabled: true,
            framebuffer_size: 512,
            clear_color: Color::black(),
            composite_scale: 0.0,
        }
    }
}

impl RendererConfig {
    pub fn with_effects(mut self, enabled: bool) -> Self {
        self.effects_enabled = enabled;
        self
    }

    pub fn with_framebuffer_size(mut self, size: u32) -> Self {
        self.framebuffer_size = size;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CompositeUniform {
    scale: f32,
    _pad: [f32; 7], // matches vec3 alignment in WGSL
}

/// Multi-pass frame renderer.
///
/// Per frame: scene groups into `fb0` (or the backbuffer when effects are
/// off), the effect chain ping-ponging between `fb1` and `fb2`, a composite
/// onto the backbuffer, then overlay groups. The pass list comes from
/// [`plan_frame`]; this type only executes it.
pub struct Renderer {
    config: RendererConfig,
    color_format: wgpu::TextureFormat,

    primary: FrameBuffer,
    aux_a: FrameBuffer,
    aux_b: FrameBuffer,
    backbuffer_depth: DepthBuffer,

    globals: FrameGlobals,
    light: Light,
    sampler: wgpu::Sampler,

    effects: Vec<Effect>,
    source_layout: wgpu::BindGroupLayout,
    params_layout: wgpu::BindGroupLayout,
    params_ubo: Option<wgpu::Buffer>,
    params_bind_group: Option<wgpu::BindGroup>,
    params_capacity: usize,
    effect_pipelines: HashMap<ProgramId, wgpu::RenderPipeline>,

    composite_layout: wgpu::BindGroupLayout,
    composite_ubo: wgpu::Buffer,
    composite_pipeline: wgpu::RenderPipeline,
    _composite: Rc<ShaderProgram>,
}

impl Renderer {
    /// Creates the renderer for a surface described by `ctx`.
    ///
    /// Registers the built-in shaders with `shaders` and compiles the
    /// composite program.
    pub fn new(
        ctx: &RenderCtx<'_>,
        shaders: &mut ShaderCache,
        config: RendererConfig,
    ) -> Result<Self, CacheError> {
        let device = ctx.device;
        let format = ctx.surface_format;
        let (width, height) = (ctx.viewport.width, ctx.viewport.height);
        let fb_size = config.framebuffer_size.max(1);

        register_builtin_shaders(shaders);
        let composite = shaders.get_program(device, FX_VERTEX, FX_COMPOSITE, None)?;

        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nergal fx source bgl"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nergal fx params bgl"),
            entries: &[uniform_entry::<EffectUniform>(0, wgpu::ShaderStages::FRAGMENT, true)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nergal composite bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                sampler_entry(2),
                uniform_entry::<CompositeUniform>(3, wgpu::ShaderStages::FRAGMENT, false),
            ],
        });

        let composite_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nergal composite ubo"),
            size: std::mem::size_of::<CompositeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let composite_pipeline =
            fullscreen_pipeline(device, "nergal composite", &[&composite_layout], &composite, format);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nergal fx sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::debug!(
            "renderer ready: {width}x{height} {format:?}, effect buffers {fb_size}x{fb_size}"
        );

        Ok(Self {
            color_format: format,
            primary: FrameBuffer::new(device, "nergal fb0", width, height, format, true),
            aux_a: FrameBuffer::new(device, "nergal fb1", fb_size, fb_size, format, false),
            aux_b: FrameBuffer::new(device, "nergal fb2", fb_size, fb_size, format, false),
            backbuffer_depth: DepthBuffer::new(device, width, height),
            globals: FrameGlobals::new(device),
            light: Light::default(),
            sampler,
            effects: Vec::new(),
            source_layout,
            params_layout,
            params_ubo: None,
            params_bind_group: None,
            params_capacity: 0,
            effect_pipelines: HashMap::new(),
            composite_layout,
            composite_ubo,
            composite_pipeline,
            _composite: composite,
            config,
        })
    }

    /// Loads an effect whose fragment stage is `fragment`.
    pub fn load_effect(
        ctx: &RenderCtx<'_>,
        shaders: &mut ShaderCache,
        fragment: &str,
    ) -> Result<Effect, CacheError> {
        let program = shaders.get_program(ctx.device, FX_VERTEX, fragment, None)?;
        Ok(Effect::new(program))
    }

    // ── configuration ──────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn effects_enabled(&self) -> bool {
        self.config.effects_enabled
    }

    pub fn set_effects_enabled(&mut self, enabled: bool) {
        if self.config.effects_enabled != enabled {
            log::debug!("effects {}", if enabled { "enabled" } else { "disabled" });
        }
        self.config.effects_enabled = enabled;
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    pub fn set_composite_scale(&mut self, scale: f32) {
        self.config.composite_scale = scale;
    }

    #[inline]
    pub fn light(&self) -> Light {
        self.light
    }

    pub fn set_light(&mut self, light: Light) {
        self.light = light;
    }

    #[inline]
    pub fn globals(&self) -> &FrameGlobals {
        &self.globals
    }

    // ── effects ────────────────────────────────────────────────────────────

    /// Inserts `effect` at `index`, or appends it when `index` is past the end.
    pub fn add_effect(&mut self, index: usize, effect: Effect) {
        log::debug!("adding effect {} at {index}", effect.program().key());
        insert_or_push(&mut self.effects, index, effect);
    }

    pub fn remove_effect(&mut self, index: usize) -> Option<Effect> {
        if index >= self.effects.len() {
            return None;
        }
        let removed = self.effects.remove(index);
        self.prune_pipelines();
        Some(removed)
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear();
        self.prune_pipelines();
    }

    #[inline]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    #[inline]
    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    // ── sizing ─────────────────────────────────────────────────────────────

    /// Tracks a new surface size: recreates `fb0` and the backbuffer depth.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.primary.resize(device, width, height);
        self.backbuffer_depth.resize(device, width, height);
    }

    pub fn set_framebuffer_size(&mut self, device: &wgpu::Device, size: u32) {
        self.config.framebuffer_size = size.max(1);
        self.aux_a.resize(device, size, size);
        self.aux_b.resize(device, size, size);
    }

    // ── frame ──────────────────────────────────────────────────────────────

    /// Records every pass of one frame into `target.encoder`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        camera: &CameraUniform,
        groups: &mut [&mut dyn MeshGroup],
    ) {
        if ctx.surface_format != self.color_format {
            log::warn!(
                "surface format changed from {:?} to {:?}; recreate the renderer",
                self.color_format,
                ctx.surface_format
            );
            return;
        }

        self.globals.write(ctx.queue, camera, self.light);

        let plan = plan_frame(self.config.effects_enabled, self.effects.len());
        if self.config.effects_enabled {
            self.write_effect_params(ctx);
            ctx.queue.write_buffer(
                &self.composite_ubo,
                0,
                bytemuck::bytes_of(&CompositeUniform {
                    scale: self.config.composite_scale,
                    _pad: [0.0; 7],
                }),
            );
        }

        for pass in plan {
            match pass {
                Pass::Scene { target: scene_target } => {
                    let (view, depth) = match scene_target {
                        SceneTarget::Backbuffer => {
                            (target.color_view, self.backbuffer_depth.view())
                        }
                        SceneTarget::Framebuffer(slot) => {
                            let fb = self.framebuffer(slot);
                            (fb.view(), fb.depth_view().unwrap_or(self.backbuffer_depth.view()))
                        }
                    };
                    let clear = wgpu::LoadOp::Clear(self.config.clear_color.to_wgpu());
                    let pass = PassInfo {
                        stage: RenderStage::Scene,
                        color_format: self.color_format,
                        depth_format: Some(DEPTH_FORMAT),
                        globals: &self.globals,
                    };
                    record_groups(ctx, target.encoder, view, Some(depth), clear, &pass, groups);
                }
                Pass::Effect { index, source, dest } => {
                    self.effect_pass(ctx, target.encoder, index, source, dest);
                }
                Pass::Composite { scene, effects } => {
                    self.composite_pass(ctx, target, scene, effects);
                }
                Pass::Overlay => {
                    let pass = PassInfo {
                        stage: RenderStage::Overlay,
                        color_format: self.color_format,
                        depth_format: None,
                        globals: &self.globals,
                    };
                    record_groups(
                        ctx,
                        target.encoder,
                        target.color_view,
                        None,
                        wgpu::LoadOp::Load,
                        &pass,
                        groups,
                    );
                }
            }
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn framebuffer(&self, slot: Slot) -> &FrameBuffer {
        match slot {
            Slot::Primary => &self.primary,
            Slot::AuxA => &self.aux_a,
            Slot::AuxB => &self.aux_b,
        }
    }

    fn prune_pipelines(&mut self) {
        let effects = &self.effects;
        self.effect_pipelines
            .retain(|id, _| effects.iter().any(|e| e.program().id() == *id));
    }

    fn write_effect_params(&mut self, ctx: &RenderCtx<'_>) {
        if self.effects.is_empty() {
            return;
        }
        self.ensure_params_capacity(ctx, self.effects.len());
        let Some(ubo) = self.params_ubo.as_ref() else { return };

        for (i, effect) in self.effects.iter().enumerate() {
            let packed = effect.params().pack();
            ctx.queue
                .write_buffer(ubo, i as u64 * EFFECT_UNIFORM_STRIDE, bytemuck::bytes_of(&packed));
        }
    }

    fn ensure_params_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.params_capacity && self.params_bind_group.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(4);
        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nergal fx params ubo"),
            size: new_cap as u64 * EFFECT_UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nergal fx params bind group"),
            layout: &self.params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(super::common::uniform_min_binding_size::<EffectUniform>()),
                }),
            }],
        });
        self.params_ubo = Some(ubo);
        self.params_bind_group = Some(bind_group);
        self.params_capacity = new_cap;
    }

    fn ensure_effect_pipeline(&mut self, ctx: &RenderCtx<'_>, program: &ShaderProgram) {
        if self.effect_pipelines.contains_key(&program.id()) {
            return;
        }
        let pipeline = fullscreen_pipeline(
            ctx.device,
            program.key(),
            &[&self.source_layout, &self.params_layout],
            program,
            self.color_format,
        );
        self.effect_pipelines.insert(program.id(), pipeline);
    }

    fn effect_pass(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        index: usize,
        source: Slot,
        dest: Slot,
    ) {
        let Some(program) = self.effects.get(index).map(|e| e.program().clone()) else { return };
        self.ensure_effect_pipeline(ctx, &program);

        let Some(pipeline) = self.effect_pipelines.get(&program.id()) else { return };
        let Some(params) = self.params_bind_group.as_ref() else { return };

        let source_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nergal fx source bind group"),
            layout: &self.source_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.framebuffer(source).view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut rpass = begin_color_pass(
            encoder,
            "nergal effect pass",
            self.framebuffer(dest).view(),
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            None,
        );
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &source_bind_group, &[]);
        rpass.set_bind_group(1, params, &[(index as u64 * EFFECT_UNIFORM_STRIDE) as u32]);
        rpass.draw(0..3, 0..1);
    }

    fn composite_pass(
        &self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: Slot,
        effects: Slot,
    ) {
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nergal composite bind group"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(self.framebuffer(scene).view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.framebuffer(effects).view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.composite_ubo.as_entire_binding(),
                },
            ],
        });

        let mut rpass = begin_color_pass(
            target.encoder,
            "nergal composite pass",
            target.color_view,
            wgpu::LoadOp::Clear(self.config.clear_color.to_wgpu()),
            None,
        );
        rpass.set_pipeline(&self.composite_pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

fn begin_color_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    depth: Option<&wgpu::TextureView>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

/// Opens one pass on `view` and lets every selected group record into it.
fn record_groups(
    ctx: &RenderCtx<'_>,
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    depth: Option<&wgpu::TextureView>,
    load: wgpu::LoadOp<wgpu::Color>,
    pass: &PassInfo<'_>,
    groups: &mut [&mut dyn MeshGroup],
) {
    let label = match pass.stage {
        RenderStage::Scene => "nergal scene pass",
        RenderStage::Overlay => "nergal overlay pass",
    };
    let selected = groups_for_stage(groups, pass.stage);

    let mut rpass = begin_color_pass(encoder, label, view, load, depth);
    for i in selected {
        groups[i].render(ctx, pass, &mut rpass);
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    program: &ShaderProgram,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: program.vertex(),
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: program.fragment(),
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: triangle_list(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
