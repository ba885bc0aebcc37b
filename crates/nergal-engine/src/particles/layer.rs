use crate::coords::{Rect, Vec2};
use crate::render::{MeshGroup, ParticleInstance, ParticleRenderer, PassInfo, RenderCtx, RenderStage};

use super::manager::ParticleManager;
use super::particle::{Particle, ParticleHandle};
use super::sink::ParticleSink;

/// Drawable collection of particle handles.
///
/// The layer never owns particles. [`ParticleLayer::sync`] resolves its
/// handles against the manager once per frame, forgets the stale ones and
/// builds the instance list the GPU draws.
pub struct ParticleLayer {
    stage: RenderStage,
    visible: bool,
    reflection: Option<f32>,
    handles: Vec<ParticleHandle>,
    instances: Vec<ParticleInstance>,
    renderer: ParticleRenderer,
}

impl Default for ParticleLayer {
    fn default() -> Self {
        Self::new(RenderStage::Scene)
    }
}

impl ParticleLayer {
    pub fn new(stage: RenderStage) -> Self {
        Self {
            stage,
            visible: true,
            reflection: None,
            handles: Vec::new(),
            instances: Vec::new(),
            renderer: ParticleRenderer::new(),
        }
    }

    /// Also draws particles above their mirror line (`Particle::ry`) reflected
    /// below it, faded by `alpha`.
    pub fn with_reflection(mut self, alpha: f32) -> Self {
        self.reflection = Some(alpha.clamp(0.0, 1.0));
        self
    }

    pub fn set_reflection(&mut self, alpha: Option<f32>) {
        self.reflection = alpha.map(|a| a.clamp(0.0, 1.0));
    }

    pub fn set_stage(&mut self, stage: RenderStage) {
        self.stage = stage;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[inline]
    pub fn handles(&self) -> &[ParticleHandle] {
        &self.handles
    }

    #[inline]
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.instances.clear();
    }

    /// Drops stale handles and rebuilds the instance list.
    ///
    /// Particles whose square does not touch `bounds` are skipped, as are
    /// fully transparent ones.
    pub fn sync(&mut self, particles: &ParticleManager, bounds: Option<Rect>) {
        self.handles.retain(|&h| particles.contains(h));
        self.instances.clear();

        for &h in &self.handles {
            let Some(p) = particles.get(h) else { continue };
            push_instance(&mut self.instances, p, p.pos, 1.0, bounds);

            let Some(alpha) = self.reflection else { continue };
            if p.pos.y <= p.ry {
                let mirrored = Vec2::new(p.pos.x, 2.0 * p.ry - p.pos.y);
                push_instance(&mut self.instances, p, mirrored, alpha, bounds);
            }
        }
    }
}

fn push_instance(
    out: &mut Vec<ParticleInstance>,
    p: &Particle,
    pos: Vec2,
    fade: f32,
    bounds: Option<Rect>,
) {
    if bounds.is_some_and(|b| !b.expanded(p.size * 0.5).contains(pos)) {
        return;
    }
    let color = p.color.premultiplied().faded(fade);
    if color.a <= 0.0 {
        return;
    }
    out.push(ParticleInstance {
        color: color.to_array(),
        center: [pos.x, pos.y],
        size: p.size,
        _pad: 0.0,
    });
}

impl ParticleSink for ParticleLayer {
    fn add(&mut self, handle: ParticleHandle) {
        self.handles.push(handle);
    }
}

impl MeshGroup for ParticleLayer {
    fn stage(&self) -> RenderStage {
        self.stage
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn render(&mut self, ctx: &RenderCtx<'_>, pass: &PassInfo<'_>, rpass: &mut wgpu::RenderPass<'_>) {
        self.renderer.draw(ctx, pass, rpass, &self.instances);
    }
}
