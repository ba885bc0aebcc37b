use bitflags::bitflags;

use crate::coords::{ColorRgba, Vec2};

bitflags! {
    /// Behaviour switches evaluated by [`super::ParticleManager::update`].
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct ParticleFlags: u8 {
        /// Cleared to retire a particle on the next update.
        const ALIVE = 0b0001;
        /// Position follows velocity.
        const LINEAR = 0b0010;
        /// Velocity is pulled downwards by the manager's gravity.
        const GRAVITATIONAL = 0b0100;
        /// Velocity is scaled by the manager's dampening factor each update.
        const DAMPENED = 0b1000;
    }
}

/// A single simulated particle.
///
/// Values are plain data; the manager owns the storage and integrates it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    /// Velocity in world units per second.
    pub dp: Vec2,
    pub size: f32,
    pub color: ColorRgba,
    /// Color change per second.
    pub dc: ColorRgba,
    /// Seconds left to live.
    pub ttl: f32,
    /// World y of the horizontal mirror axis used by reflecting layers.
    pub ry: f32,
    pub flags: ParticleFlags,
}

impl Particle {
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.flags.contains(ParticleFlags::ALIVE) && self.ttl > 0.0
    }

    /// Marks the particle for removal on the next update.
    #[inline]
    pub fn kill(&mut self) {
        self.flags.remove(ParticleFlags::ALIVE);
    }
}

/// Generation-checked reference to a particle slot.
///
/// Handles are what emitters pass to layers. Once the particle expires, is
/// recycled or the manager is cleared, the handle resolves to nothing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ParticleHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ParticleHandle {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}
