use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::common::{premul_alpha_blend, triangle_list, QuadVertex, QUAD_INDICES, QUAD_VERTICES};
use super::ctx::{PassInfo, RenderCtx};
use super::shaders::PARTICLE_SHADER;

type PipelineKey = (wgpu::TextureFormat, Option<wgpu::TextureFormat>);

/// Instanced renderer for square, premultiplied particle sprites.
///
/// One pipeline is kept per (color, depth) format pair, so the same renderer
/// can serve scene and overlay passes without rebuilding between them.
#[derive(Default)]
pub struct ParticleRenderer {
    shader: Option<wgpu::ShaderModule>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl ParticleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        pass: &PassInfo<'_>,
        rpass: &mut wgpu::RenderPass<'_>,
        instances: &[ParticleInstance],
    ) {
        if instances.is_empty() {
            return;
        }

        let key = self.ensure_pipeline(ctx, pass);
        self.ensure_static_buffers(ctx);
        self.ensure_instance_capacity(ctx, instances.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(instances));

        let Some(pipeline) = self.pipelines.get(&key) else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, pass.globals.bind_group(), &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    /// Number of pipelines built so far, one per pass format pair seen.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>, pass: &PassInfo<'_>) -> PipelineKey {
        let key = (pass.color_format, pass.depth_format);
        if self.pipelines.contains_key(&key) {
            return key;
        }

        let shader = self.shader.get_or_insert_with(|| {
            ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("nergal particle shader"),
                source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
            })
        });

        let pipeline_layout = self.pipeline_layout.get_or_insert_with(|| {
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("nergal particle pipeline layout"),
                bind_group_layouts: &[pass.globals.layout()],
                immediate_size: 0,
            })
        });

        let depth_stencil = pass.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("nergal particle pipeline"),
            layout: Some(pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), ParticleInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: pass.color_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: triangle_list(),
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built particle pipeline for {:?} / {:?}", key.0, key.1);
        self.pipelines.insert(key, pipeline);
        key
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nergal particle quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nergal particle quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<ParticleInstance>()) as u64;
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nergal particle instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (32 bytes):
///
///  offset  0  color   [f32; 4]   loc 3  (premultiplied)
///  offset 16  center  [f32; 2]   loc 1
///  offset 24  size    f32        loc 2
///  offset 28  _pad    f32
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub color: [f32; 4],
    pub center: [f32; 2],
    pub size: f32,
    pub _pad: f32,
}

impl ParticleInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        3 => Float32x4, // color
        1 => Float32x2, // center
        2 => Float32    // size
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::render::{FrameGlobals, RenderStage, DEPTH_FORMAT};

    #[test]
    fn instance_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
    }

    #[test]
    fn pipelines_are_kept_per_format_pair() {
        let Some((device, queue)) = crate::device::headless::device() else { return };
        let globals = FrameGlobals::new(&device);
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let ctx = RenderCtx::new(&device, &queue, format, Viewport::new(64, 64));

        let scene = PassInfo {
            stage: RenderStage::Scene,
            color_format: format,
            depth_format: Some(DEPTH_FORMAT),
            globals: &globals,
        };
        let overlay = PassInfo {
            stage: RenderStage::Overlay,
            color_format: format,
            depth_format: None,
            globals: &globals,
        };

        let mut renderer = ParticleRenderer::new();
        for _ in 0..3 {
            renderer.ensure_pipeline(&ctx, &scene);
            renderer.ensure_pipeline(&ctx, &overlay);
        }
        assert_eq!(renderer.pipeline_count(), 2);
    }
}
