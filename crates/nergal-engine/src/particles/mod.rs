//! Particle simulation: the pooled manager, emission recipes, emitters and
//! the layers that draw what the emitters produce.
//!
//! Ownership: the [`ParticleManager`] owns every particle; emitters and
//! layers only exchange [`ParticleHandle`]s. Emitters reach their layer
//! through a `Weak` reference.

mod emitter;
mod layer;
mod manager;
mod particle;
pub(crate) mod random;
mod recipe;
mod sink;

pub use emitter::{CustomUpdate, EmitCtx, Emitter, EmitterState};
pub use layer::ParticleLayer;
pub use manager::{ParticleConfig, ParticleManager};
pub use particle::{Particle, ParticleFlags, ParticleHandle};
pub use recipe::{EmitterKind, Recipe};
pub use sink::ParticleSink;
