use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::camera::Camera2;
use crate::particles::{ParticleConfig, ParticleManager};

/// State shared by every scene.
#[derive(Debug)]
pub struct World {
    pub particles: ParticleManager,
    pub camera: Camera2,
    pub rng: StdRng,
    pub debug: bool,
}

impl World {
    pub fn new(particles: ParticleConfig, camera: Camera2) -> Self {
        Self {
            particles: ParticleManager::with_config(particles),
            camera,
            rng: StdRng::from_entropy(),
            debug: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(ParticleConfig::default(), Camera2::default())
    }
}
