use crate::coords::{ColorRgba, Vec2};

use super::particle::ParticleFlags;

/// Emission algorithm used by an [`super::Emitter`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EmitterKind {
    Linear,
    Uniform,
    Layered,
    Radial,
    Flame,
    Smoke,
    Fountain,
    Explosion,
    Spiral,
    Custom,
}

impl EmitterKind {
    /// Per-update bound of the drift angle random walk.
    pub const fn default_max_change(self) -> f32 {
        match self {
            EmitterKind::Flame => 0.25,
            EmitterKind::Smoke => 0.15,
            EmitterKind::Fountain => 0.2,
            _ => 0.0,
        }
    }
}

const fn rgba(r: f32, g: f32, b: f32, a: f32) -> ColorRgba {
    ColorRgba::new(r, g, b, a)
}

const NONE: ColorRgba = ColorRgba::transparent();

const BASE: ParticleFlags = ParticleFlags::ALIVE.union(ParticleFlags::LINEAR);

/// Immutable emission template copied into each emitter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Recipe {
    pub kind: EmitterKind,
    pub flags: ParticleFlags,
    /// Particles per second (per burst for explosions).
    pub rate: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_ttl: f32,
    pub max_ttl: f32,
    pub min_dp: Vec2,
    pub max_dp: Vec2,
    pub colors: [ColorRgba; 4],
    pub dc: ColorRgba,
}

impl Recipe {
    /// A blank template of `kind` emitting nothing until its fields are set.
    pub const fn new(kind: EmitterKind) -> Self {
        Self {
            kind,
            flags: BASE,
            rate: 0.0,
            min_size: 1.0,
            max_size: 1.0,
            min_ttl: 1.0,
            max_ttl: 1.0,
            min_dp: Vec2::zero(),
            max_dp: Vec2::zero(),
            colors: [ColorRgba::white(), NONE, NONE, NONE],
            dc: NONE,
        }
    }

    pub const FLAME: Recipe = Recipe {
        kind: EmitterKind::Flame,
        flags: BASE,
        rate: 400.0,
        min_size: 1.0,
        max_size: 6.0,
        min_ttl: 1.0,
        max_ttl: 5.0,
        min_dp: Vec2::new(2.0, 25.0),
        max_dp: Vec2::new(2.0, 40.0),
        colors: [rgba(1.0, 1.0, 0.0, 1.0), rgba(0.0, 0.25, 0.0, 0.0), NONE, NONE],
        dc: rgba(0.0, -0.5, 0.0, -0.05),
    };

    pub const SMOKE: Recipe = Recipe {
        kind: EmitterKind::Smoke,
        flags: BASE,
        rate: 100.0,
        min_size: 4.0,
        max_size: 8.0,
        min_ttl: 2.0,
        max_ttl: 6.0,
        min_dp: Vec2::new(4.0, 15.0),
        max_dp: Vec2::new(1.0, 25.0),
        colors: [ColorRgba::white(), NONE, NONE, NONE],
        dc: rgba(0.0, 0.0, 0.0, -0.5),
    };

    pub const FOUNTAIN: Recipe = Recipe {
        kind: EmitterKind::Fountain,
        flags: BASE.union(ParticleFlags::GRAVITATIONAL),
        rate: 200.0,
        min_size: 1.0,
        max_size: 4.0,
        min_ttl: 4.0,
        max_ttl: 6.0,
        min_dp: Vec2::new(0.0, 40.0),
        max_dp: Vec2::new(4.0, 50.0),
        colors: [
            rgba(0.47, 0.945, 1.0, 0.8),
            rgba(0.0, 0.8, 0.976, 0.866),
            rgba(0.0, 0.596, 0.862, 0.933),
            rgba(0.0, 0.411, 0.666, 1.0),
        ],
        dc: rgba(0.0, 0.0, 0.0, -0.05),
    };

    pub const EXPLOSION: Recipe = Recipe {
        kind: EmitterKind::Explosion,
        flags: BASE.union(ParticleFlags::DAMPENED),
        rate: 100.0,
        min_size: 1.0,
        max_size: 6.0,
        min_ttl: 1.0,
        max_ttl: 5.0,
        min_dp: Vec2::new(0.0, 25.0),
        max_dp: Vec2::new(0.0, 35.0),
        colors: [rgba(1.0, 1.0, 0.0, 1.0), NONE, NONE, NONE],
        dc: rgba(0.0, -1.0, 0.0, -0.1),
    };

    pub const SPIRAL: Recipe = Recipe {
        kind: EmitterKind::Spiral,
        flags: BASE,
        rate: 100.0,
        min_size: 1.0,
        max_size: 4.0,
        min_ttl: 1.0,
        max_ttl: 5.0,
        min_dp: Vec2::new(4.0, 3.0),
        max_dp: Vec2::new(64.0, 64.0),
        colors: [rgba(1.0, 1.0, 0.0, 1.0), NONE, NONE, NONE],
        dc: rgba(0.0, -1.0, 0.0, -0.1),
    };

    pub const SNOW: Recipe = Recipe {
        kind: EmitterKind::Layered,
        flags: BASE,
        rate: 40.0,
        min_size: 1.0,
        max_size: 3.0,
        min_ttl: 10.0,
        max_ttl: 10.0,
        min_dp: Vec2::new(-2.0, 24.0),
        max_dp: Vec2::new(4.0, 36.0),
        colors: [
            ColorRgba::from_rgba_u32(0xffffffff),
            ColorRgba::from_rgba_u32(0xffffffc0),
            ColorRgba::from_rgba_u32(0xc7cfddc0),
            ColorRgba::from_rgba_u32(0x94fdffc0),
        ],
        dc: rgba(0.0, 0.0, 0.0, -0.005),
    };

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_flags(mut self, flags: ParticleFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_size(mut self, min: f32, max: f32) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    pub fn with_ttl(mut self, min: f32, max: f32) -> Self {
        self.min_ttl = min;
        self.max_ttl = max;
        self
    }

    pub fn with_velocity(mut self, min_dp: Vec2, max_dp: Vec2) -> Self {
        self.min_dp = min_dp;
        self.max_dp = max_dp;
        self
    }

    pub fn with_colors(mut self, colors: [ColorRgba; 4]) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_decay(mut self, dc: ColorRgba) -> Self {
        self.dc = dc;
        self
    }
}
