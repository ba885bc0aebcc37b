//! Engine-wide configuration, read once when the game starts.

use std::path::PathBuf;

use crate::coords::Vec2;
use crate::particles::ParticleConfig;
use crate::render::RendererConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub particles: ParticleConfig,
    pub renderer: RendererConfig,
    /// Directory searched for shader files not registered in memory.
    pub shader_dir: PathBuf,
    pub texture_dir: PathBuf,
    /// Logical camera size. Zero follows the window size.
    pub camera_size: Vec2,
    /// Fixed seed for the shared random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particles: ParticleConfig::default(),
            renderer: RendererConfig::default(),
            shader_dir: PathBuf::from("resources/shaders"),
            texture_dir: PathBuf::from("resources/textures"),
            camera_size: Vec2::zero(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_particles(mut self, particles: ParticleConfig) -> Self {
        self.particles = particles;
        self
    }

    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.particles.gravity = gravity;
        self
    }

    pub fn with_dampening(mut self, dampening: f32) -> Self {
        self.particles.dampening = dampening;
        self
    }

    pub fn with_particle_capacity(mut self, capacity: usize) -> Self {
        self.particles.capacity = capacity;
        self
    }

    pub fn with_effects(mut self, enabled: bool) -> Self {
        self.renderer.effects_enabled = enabled;
        self
    }

    pub fn with_resource_dirs(
        mut self,
        shaders: impl Into<PathBuf>,
        textures: impl Into<PathBuf>,
    ) -> Self {
        self.shader_dir = shaders.into();
        self.texture_dir = textures.into();
        self
    }

    pub fn with_camera_size(mut self, width: f32, height: f32) -> Self {
        self.camera_size = Vec2::new(width, height);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_reach_nested_configs() {
        let cfg = EngineConfig::default()
            .with_gravity(40.0)
            .with_particle_capacity(64)
            .with_effects(false)
            .with_resource_dirs("sh", "tx");

        assert_eq!(cfg.particles.gravity, 40.0);
        assert_eq!(cfg.particles.capacity, 64);
        assert!((cfg.particles.dampening - 0.99).abs() < f32::EPSILON);
        assert!(!cfg.renderer.effects_enabled);
        assert_eq!(cfg.shader_dir, PathBuf::from("sh"));
        assert_eq!(cfg.texture_dir, PathBuf::from("tx"));
        assert_eq!(cfg.camera_size, Vec2::zero());
    }
}
