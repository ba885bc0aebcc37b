use std::collections::VecDeque;

use super::particle::{Particle, ParticleFlags, ParticleHandle};

/// Particle pool configuration.
#[derive(Debug, Clone)]
pub struct ParticleConfig {
    /// Maximum number of live particles.
    pub capacity: usize,
    /// Downward acceleration applied to `GRAVITATIONAL` particles (units/s²).
    pub gravity: f32,
    /// Velocity factor applied to `DAMPENED` particles on every update.
    pub dampening: f32,
    /// When the pool is full, evict the oldest particle instead of refusing.
    pub recycling: bool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            gravity: 25.0,
            dampening: 0.99,
            recycling: true,
        }
    }
}

impl ParticleConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_dampening(mut self, dampening: f32) -> Self {
        self.dampening = dampening;
        self
    }

    pub fn with_recycling(mut self, recycling: bool) -> Self {
        self.recycling = recycling;
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    particle: Particle,
    generation: u32,
    live: bool,
}

/// Owner of every particle on screen.
///
/// Storage is an index-addressed arena that never grows past `capacity`.
/// `order` lists live slots oldest first, which makes FIFO recycling O(1) and
/// keeps iteration deterministic. Handles carry the slot generation so that a
/// slot reused after eviction is never mistaken for the particle it replaced.
#[derive(Debug)]
pub struct ParticleManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: VecDeque<u32>,
    capacity: usize,
    gravity: f32,
    dampening: f32,
    recycling: bool,
}

impl Default for ParticleManager {
    fn default() -> Self {
        Self::with_config(ParticleConfig::default())
    }
}

impl ParticleManager {
    pub fn new(capacity: usize) -> Self {
        Self::with_config(ParticleConfig::default().with_capacity(capacity))
    }

    pub fn with_config(config: ParticleConfig) -> Self {
        Self {
            slots: Vec::with_capacity(config.capacity),
            free: Vec::new(),
            order: VecDeque::with_capacity(config.capacity),
            capacity: config.capacity,
            gravity: config.gravity,
            dampening: config.dampening,
            recycling: config.recycling,
        }
    }

    /// Allocates a fresh particle flagged `ALIVE`.
    ///
    /// Returns `None` only when the pool is full and recycling is disabled (or the
    /// capacity is zero).
    pub fn create_particle(&mut self) -> Option<(ParticleHandle, &mut Particle)> {
        let index = self.acquire_slot()?;
        self.order.push_back(index);

        let slot = &mut self.slots[index as usize];
        slot.particle = Particle {
            flags: ParticleFlags::ALIVE,
            ..Particle::default()
        };
        slot.live = true;

        let handle = ParticleHandle { index, generation: slot.generation };
        Some((handle, &mut slot.particle))
    }

    /// Takes ownership of an already populated particle.
    pub fn add_particle(&mut self, particle: Particle) -> Option<ParticleHandle> {
        let (handle, slot) = self.create_particle()?;
        *slot = particle;
        Some(handle)
    }

    /// Integrates every live particle by `delta` seconds and drops expired ones.
    pub fn update(&mut self, delta: f32) {
        let gravity = self.gravity;
        let dampening = self.dampening;
        let slots = &mut self.slots;
        let free = &mut self.free;

        self.order.retain(|&index| {
            let slot = &mut slots[index as usize];
            let p = &mut slot.particle;

            if p.flags.contains(ParticleFlags::ALIVE) {
                if p.flags.contains(ParticleFlags::LINEAR) {
                    p.pos += p.dp * delta;
                }
                if p.flags.contains(ParticleFlags::GRAVITATIONAL) {
                    p.dp.y += gravity * delta;
                }
                if p.flags.contains(ParticleFlags::DAMPENED) {
                    p.dp *= dampening;
                }
                p.color += p.dc * delta;
                p.ttl -= delta;
            }

            if p.flags.contains(ParticleFlags::ALIVE) && p.ttl > 0.0 {
                return true;
            }

            p.ttl = p.ttl.max(0.0);
            slot.live = false;
            slot.generation = slot.generation.wrapping_add(1);
            free.push(index);
            false
        });
    }

    /// Drops every particle. Outstanding handles become stale.
    pub fn clear(&mut self) {
        log::debug!("clearing {} particle(s)", self.order.len());
        while let Some(index) = self.order.pop_front() {
            self.retire(index);
            self.free.push(index);
        }
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &s.particle)
    }

    pub fn get_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &mut s.particle)
    }

    #[inline]
    pub fn contains(&self, handle: ParticleHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterates live particles, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleHandle, &Particle)> + '_ {
        self.order.iter().map(|&index| {
            let slot = &self.slots[index as usize];
            (ParticleHandle { index, generation: slot.generation }, &slot.particle)
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    #[inline]
    pub fn dampening(&self) -> f32 {
        self.dampening
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    pub fn set_dampening(&mut self, dampening: f32) {
        self.dampening = dampening;
    }

    pub fn set_recycling(&mut self, recycling: bool) {
        self.recycling = recycling;
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn acquire_slot(&mut self) -> Option<u32> {
        if let Some(index) = self.free.pop() {
            return Some(index);
        }

        if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                particle: Particle::default(),
                generation: 0,
                live: false,
            });
            return Some((self.slots.len() - 1) as u32);
        }

        if !self.recycling {
            return None;
        }

        let oldest = self.order.pop_front()?;
        self.retire(oldest);
        log::trace!("particle pool full ({}), recycling slot {oldest}", self.capacity);
        Some(oldest)
    }

    fn retire(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{ColorRgba, Vec2};

    fn spawn(pm: &mut ParticleManager, ttl: f32, flags: ParticleFlags) -> ParticleHandle {
        let (h, p) = pm.create_particle().unwrap();
        p.ttl = ttl;
        p.flags = flags;
        h
    }

    const MOVING: ParticleFlags = ParticleFlags::ALIVE.union(ParticleFlags::LINEAR);

    #[test]
    fn created_particles_are_alive() {
        let mut pm = ParticleManager::new(4);
        let (h, p) = pm.create_particle().unwrap();
        assert!(p.flags.contains(ParticleFlags::ALIVE));
        assert!(pm.contains(h));
        assert_eq!(pm.len(), 1);
    }

    #[test]
    fn full_pool_evicts_oldest() {
        let mut pm = ParticleManager::new(3);
        let first = spawn(&mut pm, 10.0, MOVING);
        let second = spawn(&mut pm, 10.0, MOVING);
        let third = spawn(&mut pm, 10.0, MOVING);

        let fourth = spawn(&mut pm, 10.0, MOVING);

        assert_eq!(pm.len(), 3);
        assert!(!pm.contains(first));
        assert!(pm.contains(second));
        assert!(pm.contains(third));
        assert!(pm.contains(fourth));
        // Same slot, different generation.
        assert_eq!(first.index(), fourth.index());
    }

    #[test]
    fn pool_never_exceeds_capacity() {
        let mut pm = ParticleManager::new(1000);
        for _ in 0..2500 {
            let (_, p) = pm.create_particle().unwrap();
            p.ttl = 1.0;
        }
        assert_eq!(pm.len(), 1000);
        assert_eq!(pm.capacity(), 1000);
    }

    #[test]
    fn recycling_disabled_refuses_when_full() {
        let mut pm = ParticleManager::with_config(
            ParticleConfig::default().with_capacity(2).with_recycling(false),
        );
        spawn(&mut pm, 1.0, MOVING);
        spawn(&mut pm, 1.0, MOVING);
        assert!(pm.create_particle().is_none());
        assert_eq!(pm.len(), 2);
    }

    #[test]
    fn zero_capacity_yields_nothing() {
        let mut pm = ParticleManager::new(0);
        assert!(pm.create_particle().is_none());
    }

    #[test]
    fn expired_particles_removed_same_tick() {
        let mut pm = ParticleManager::new(8);
        let short = spawn(&mut pm, 0.5, MOVING);
        let long = spawn(&mut pm, 2.0, MOVING);

        pm.update(0.5);
        assert!(!pm.contains(short));
        assert!(pm.contains(long));
        assert_eq!(pm.len(), 1);
    }

    #[test]
    fn zero_ttl_removed_on_next_update() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 0.0, MOVING);
        pm.update(0.016);
        assert!(!pm.contains(h));
        assert!(pm.is_empty());
    }

    #[test]
    fn ttl_never_negative() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 1.0, MOVING);
        for _ in 0..3 {
            pm.update(0.3);
            if let Some(p) = pm.get(h) {
                assert!(p.ttl > 0.0);
            }
        }
        pm.update(0.3);
        assert!(!pm.contains(h));
    }

    #[test]
    fn killed_particles_are_reclaimed() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 5.0, MOVING);
        pm.get_mut(h).unwrap().kill();
        pm.update(0.01);
        assert!(pm.is_empty());
    }

    #[test]
    fn linear_motion_integrates_velocity() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 5.0, MOVING);
        pm.get_mut(h).unwrap().dp = Vec2::new(10.0, -4.0);
        pm.update(0.5);
        assert_eq!(pm.get(h).unwrap().pos, Vec2::new(5.0, -2.0));
    }

    #[test]
    fn non_linear_particles_stay_put() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 5.0, ParticleFlags::ALIVE);
        pm.get_mut(h).unwrap().dp = Vec2::new(10.0, 10.0);
        pm.update(0.5);
        assert_eq!(pm.get(h).unwrap().pos, Vec2::zero());
    }

    #[test]
    fn gravity_increases_downward_speed_monotonically() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 100.0, MOVING | ParticleFlags::GRAVITATIONAL);
        let mut last = pm.get(h).unwrap().dp.y;
        for _ in 0..20 {
            pm.update(0.05);
            let dy = pm.get(h).unwrap().dp.y;
            assert!(dy > last);
            last = dy;
        }
        assert!((last - 25.0).abs() < 1e-3);
    }

    #[test]
    fn dampening_decreases_speed_monotonically() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 100.0, MOVING | ParticleFlags::DAMPENED);
        pm.get_mut(h).unwrap().dp = Vec2::new(30.0, -40.0);
        let mut last = pm.get(h).unwrap().dp.length();
        for _ in 0..20 {
            pm.update(0.05);
            let speed = pm.get(h).unwrap().dp.length();
            assert!(speed < last);
            last = speed;
        }
    }

    #[test]
    fn color_decays_per_second() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 5.0, MOVING);
        {
            let p = pm.get_mut(h).unwrap();
            p.color = ColorRgba::white();
            p.dc = ColorRgba::new(0.0, -0.5, 0.0, -0.25);
        }
        pm.update(1.0);
        let c = pm.get(h).unwrap().color;
        assert_eq!(c, ColorRgba::new(1.0, 0.5, 1.0, 0.75));
    }

    #[test]
    fn setters_apply_uniformly() {
        let mut pm = ParticleManager::new(8);
        pm.set_gravity(100.0);
        let a = spawn(&mut pm, 10.0, MOVING | ParticleFlags::GRAVITATIONAL);
        let b = spawn(&mut pm, 10.0, MOVING | ParticleFlags::GRAVITATIONAL);
        pm.update(0.5);
        assert_eq!(pm.get(a).unwrap().dp.y, 50.0);
        assert_eq!(pm.get(b).unwrap().dp.y, 50.0);
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut pm = ParticleManager::new(8);
        let h = spawn(&mut pm, 5.0, MOVING);
        pm.clear();
        assert!(pm.is_empty());
        assert!(!pm.contains(h));
        // Slots are reusable after a clear.
        assert!(pm.create_particle().is_some());
    }

    #[test]
    fn add_particle_takes_owned_record() {
        let mut pm = ParticleManager::new(2);
        let h = pm
            .add_particle(Particle {
                ttl: 3.0,
                size: 4.0,
                flags: MOVING,
                ..Particle::default()
            })
            .unwrap();
        assert_eq!(pm.get(h).unwrap().size, 4.0);
    }

    #[test]
    fn iteration_is_oldest_first_after_removal() {
        let mut pm = ParticleManager::new(8);
        let a = spawn(&mut pm, 5.0, MOVING);
        let b = spawn(&mut pm, 0.1, MOVING);
        let c = spawn(&mut pm, 5.0, MOVING);
        pm.update(0.2);
        let order: Vec<_> = pm.iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![a, c]);
        assert!(!pm.contains(b));
    }
}
