use super::particle::ParticleHandle;

/// Receiver of freshly emitted particles.
///
/// Emitters only ever see a layer through this trait, held by a `Weak`
/// reference, so dropping a layer silently stops emission into it.
pub trait ParticleSink {
    fn add(&mut self, handle: ParticleHandle);
}

impl ParticleSink for Vec<ParticleHandle> {
    fn add(&mut self, handle: ParticleHandle) {
        self.push(handle);
    }
}
