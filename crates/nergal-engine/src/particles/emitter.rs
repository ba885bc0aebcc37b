use std::cell::RefCell;
use std::f32::consts::TAU;
use std::fmt;
use std::rc::{Rc, Weak};

use rand::RngCore;

use crate::coords::Vec2;

use super::manager::ParticleManager;
use super::particle::{Particle, ParticleFlags};
use super::random::{index, int_range, lerp, range, unit, vec_range};
use super::recipe::{EmitterKind, Recipe};
use super::sink::ParticleSink;

/// Everything an emitter may touch while updating.
pub struct EmitCtx<'a> {
    pub particles: &'a mut ParticleManager,
    pub rng: &'a mut dyn RngCore,
}

/// User-supplied update for [`EmitterKind::Custom`] emitters.
pub type CustomUpdate = Box<dyn FnMut(&mut EmitterState, &mut EmitCtx<'_>, f32)>;

type UpdateFn = fn(&mut EmitterState, &mut EmitCtx<'_>, f32);

/// Slack for f32 rounding in `rate * delta` sums; a unit this close to whole
/// is spawned now instead of one frame late.
const ACCUMULATOR_EPSILON: f32 = 1e-4;

#[inline]
fn has_whole_unit(accumulator: f32) -> bool {
    accumulator >= 1.0 - ACCUMULATOR_EPSILON
}

/// Mutable per-instance emitter data.
pub struct EmitterState {
    pub recipe: Recipe,
    /// World position.
    pub pos: Vec2,
    /// Spawn offsets relative to `pos`. Uniform and layered kinds read the
    /// first two as the corners of the spawn box.
    pub offsets: Vec<Vec2>,
    /// Distance from the emitter to the mirror line written into `Particle::ry`.
    pub mirror_offset: f32,
    /// Seconds until the emitter deactivates itself; `0.0` means forever.
    pub ttl: f32,
    pub age: f32,
    pub accumulator: f32,
    pub active: bool,
    /// Drift angle (flame, smoke, fountain) or rotation (spiral), in radians.
    pub angle: f32,
    pub max_change: f32,
    /// Seconds between explosion bursts; `<= 0.0` bursts once.
    pub repeat_interval: f32,
    burst_timer: f32,
    bursts: u32,
    target: Option<Weak<RefCell<dyn ParticleSink>>>,
}

impl EmitterState {
    fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            pos: Vec2::zero(),
            offsets: Vec::new(),
            mirror_offset: 0.0,
            ttl: 0.0,
            age: 0.0,
            accumulator: 0.0,
            active: true,
            angle: 0.0,
            max_change: recipe.kind.default_max_change(),
            repeat_interval: 5.0,
            burst_timer: 0.0,
            bursts: 0,
            target: None,
        }
    }

    /// Number of explosion bursts fired so far.
    pub fn bursts(&self) -> u32 {
        self.bursts
    }

    /// The target layer, if one is set and still alive.
    pub fn target(&self) -> Option<Rc<RefCell<dyn ParticleSink>>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// Allocates one particle, seeds the recipe defaults, lets `populate` fill
    /// in the kind-specific values and hands the result to `sink`.
    ///
    /// Returns `false` when the manager refused the allocation.
    pub fn spawn(
        &self,
        ctx: &mut EmitCtx<'_>,
        sink: &mut dyn ParticleSink,
        populate: impl FnOnce(&EmitterState, &mut dyn RngCore, &mut Particle),
    ) -> bool {
        let Some((handle, p)) = ctx.particles.create_particle() else {
            return false;
        };
        p.flags = self.recipe.flags | ParticleFlags::ALIVE;
        p.ry = self.pos.y + self.mirror_offset;
        p.dc = self.recipe.dc;
        populate(self, &mut *ctx.rng, p);
        sink.add(handle);
        true
    }

    fn random_offset(&self, rng: &mut dyn RngCore) -> Vec2 {
        if self.offsets.is_empty() {
            return Vec2::zero();
        }
        self.offsets[index(rng, self.offsets.len())]
    }

    fn random_in_box(&self, rng: &mut dyn RngCore) -> Vec2 {
        vec_range(rng, self.offsets[0], self.offsets[1])
    }

    fn drift(&mut self, rng: &mut dyn RngCore) {
        if self.max_change > 0.0 {
            self.angle += range(rng, -self.max_change, self.max_change);
        }
    }

    fn accumulate(&mut self, delta: f32) {
        self.accumulator += self.recipe.rate * delta;
    }

    /// Runs the rate accumulator, spawning one particle per whole unit.
    fn emit_continuous(
        &mut self,
        ctx: &mut EmitCtx<'_>,
        delta: f32,
        populate: fn(&EmitterState, &mut dyn RngCore, &mut Particle),
    ) {
        self.accumulate(delta);
        if !has_whole_unit(self.accumulator) {
            return;
        }
        let Some(target) = self.target() else { return };
        let Ok(mut sink) = target.try_borrow_mut() else {
            log::warn!("particle layer is busy, skipping emission this frame");
            return;
        };

        while has_whole_unit(self.accumulator) {
            if !self.spawn(ctx, &mut *sink, populate) {
                break;
            }
            self.accumulator -= 1.0;
        }
    }
}

impl fmt::Debug for EmitterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterState")
            .field("kind", &self.recipe.kind)
            .field("pos", &self.pos)
            .field("age", &self.age)
            .field("accumulator", &self.accumulator)
            .field("active", &self.active)
            .field("has_target", &self.target().is_some())
            .finish_non_exhaustive()
    }
}

/// A particle source driven once per frame by elapsed time.
pub struct Emitter {
    state: EmitterState,
    custom: Option<CustomUpdate>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("state", &self.state)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl Emitter {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            state: EmitterState::new(recipe),
            custom: None,
        }
    }

    /// An emitter whose behaviour is entirely supplied by `update`.
    pub fn custom(
        recipe: Recipe,
        update: impl FnMut(&mut EmitterState, &mut EmitCtx<'_>, f32) + 'static,
    ) -> Self {
        let recipe = Recipe { kind: EmitterKind::Custom, ..recipe };
        Self {
            state: EmitterState::new(recipe),
            custom: Some(Box::new(update)),
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.state.pos = pos;
        self
    }

    pub fn with_offsets(mut self, offsets: impl Into<Vec<Vec2>>) -> Self {
        self.state.offsets = offsets.into();
        self
    }

    pub fn with_mirror_offset(mut self, mirror_offset: f32) -> Self {
        self.state.mirror_offset = mirror_offset;
        self
    }

    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.state.ttl = ttl;
        self
    }

    pub fn with_repeat_interval(mut self, seconds: f32) -> Self {
        self.state.repeat_interval = seconds;
        self
    }

    pub fn with_max_change(mut self, max_change: f32) -> Self {
        self.state.max_change = max_change;
        self
    }

    pub fn with_target<L: ParticleSink + 'static>(mut self, layer: &Rc<RefCell<L>>) -> Self {
        self.set_target_layer(layer);
        self
    }

    /// Points emission at `layer` without taking ownership of it.
    pub fn set_target_layer<L: ParticleSink + 'static>(&mut self, layer: &Rc<RefCell<L>>) {
        let layer: Rc<RefCell<dyn ParticleSink>> = layer.clone();
        self.state.target = Some(Rc::downgrade(&layer));
    }

    pub fn clear_target_layer(&mut self) {
        self.state.target = None;
    }

    #[inline]
    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut EmitterState {
        &mut self.state
    }

    #[inline]
    pub fn kind(&self) -> EmitterKind {
        self.state.recipe.kind
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.state.active = active;
    }

    /// Advances the emitter by `delta` seconds, creating particles in
    /// `particles` and forwarding their handles to the target layer.
    pub fn update(&mut self, particles: &mut ParticleManager, rng: &mut dyn RngCore, delta: f32) {
        if !self.state.active {
            return;
        }

        let mut ctx = EmitCtx { particles, rng };
        match (&mut self.custom, self.state.recipe.kind) {
            (Some(custom), EmitterKind::Custom) => custom(&mut self.state, &mut ctx, delta),
            (_, kind) => update_fn(kind)(&mut self.state, &mut ctx, delta),
        }

        let s = &mut self.state;
        s.age += delta;
        if s.ttl > 0.0 && s.age >= s.ttl {
            s.active = false;
            log::debug!("{:?} emitter expired after {:.2}s", s.recipe.kind, s.age);
        }
    }
}

// ── dispatch ───────────────────────────────────────────────────────────────

fn update_fn(kind: EmitterKind) -> UpdateFn {
    match kind {
        EmitterKind::Linear => update_linear,
        EmitterKind::Uniform => update_uniform,
        EmitterKind::Layered => update_layered,
        EmitterKind::Radial => update_radial,
        EmitterKind::Flame => update_flame,
        EmitterKind::Smoke => update_smoke,
        EmitterKind::Fountain => update_fountain,
        EmitterKind::Explosion => update_explosion,
        EmitterKind::Spiral => update_spiral,
        EmitterKind::Custom => update_none,
    }
}

fn update_none(_: &mut EmitterState, _: &mut EmitCtx<'_>, _: f32) {}

fn random_look(s: &EmitterState, rng: &mut dyn RngCore, p: &mut Particle) {
    let r = &s.recipe;
    p.size = range(rng, r.min_size, r.max_size);
    p.color = r.colors[index(rng, r.colors.len())];
    p.ttl = range(rng, r.min_ttl, r.max_ttl);
}

/// Size, color and ttl keyed off one shared random factor.
fn faded_look(s: &EmitterState, rng: &mut dyn RngCore, p: &mut Particle) {
    let r = &s.recipe;
    let n = unit(rng);
    p.size = lerp(r.min_size, r.max_size, n);
    p.color = r.colors[0];
    p.dc.a -= n;
    p.ttl = lerp(r.min_ttl, r.max_ttl, 1.0 - n);
}

fn update_linear(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.emit_continuous(ctx, delta, |s, rng, p| {
        p.pos = s.pos + s.random_offset(rng);
        p.dp = vec_range(rng, s.recipe.min_dp, s.recipe.max_dp);
        random_look(s, rng, p);
    });
}

fn update_uniform(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    if s.offsets.len() < 2 {
        s.accumulate(delta);
        return;
    }
    s.emit_continuous(ctx, delta, |s, rng, p| {
        p.pos = s.pos + s.random_in_box(rng);
        p.dp = vec_range(rng, s.recipe.min_dp, s.recipe.max_dp);
        random_look(s, rng, p);
    });
}

fn update_layered(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    if s.offsets.len() < 2 {
        s.accumulate(delta);
        return;
    }
    s.emit_continuous(ctx, delta, |s, rng, p| {
        let r = &s.recipe;
        let z = index(rng, r.colors.len());
        p.pos = s.pos + s.random_in_box(rng);
        // Upper layers are background: slower and dimmer.
        p.dp = if z >= 2 { r.min_dp } else { r.max_dp };
        p.size = int_range(rng, r.min_size, r.max_size);
        p.color = r.colors[z];
        p.ttl = range(rng, r.min_ttl, r.max_ttl);
    });
}

fn radial_motion(s: &EmitterState, rng: &mut dyn RngCore, p: &mut Particle) {
    let r = &s.recipe;
    let dir = Vec2::new(0.0, -1.0).rotate(range(rng, 0.0, TAU));
    p.pos = s.pos + s.random_offset(rng);
    if r.min_dp.x != 0.0 {
        p.pos += dir * r.min_dp.x;
    }
    p.dp = dir * range(rng, r.min_dp.y, r.max_dp.y);
}

fn update_radial(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.emit_continuous(ctx, delta, |s, rng, p| {
        radial_motion(s, rng, p);
        random_look(s, rng, p);
    });
}

/// Horizontal part of the drift vector `(0, radius)` rotated by `angle`.
fn drift_offset(angle: f32, radius: f32) -> Vec2 {
    let mut o = Vec2::new(0.0, radius).rotate(angle);
    o.y = 0.0;
    o
}

fn update_flame(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.drift(&mut *ctx.rng);
    s.emit_continuous(ctx, delta, |s, rng, p| {
        let r = &s.recipe;
        let o = drift_offset(s.angle, r.min_dp.x);
        p.pos = s.pos + o + s.random_offset(rng);
        p.dp = Vec2::new(r.max_dp.x * o.x, -range(rng, r.min_dp.y, r.max_dp.y));

        let n = unit(rng);
        p.size = lerp(r.min_size, r.max_size, n);
        let reach = 4.0 * r.min_dp.x;
        let dist = if reach != 0.0 { o.x.abs() / reach } else { 0.0 };
        p.color = r.colors[0] - r.colors[1] * dist;
        p.dc.a -= n;
        p.ttl = lerp(r.min_ttl, r.max_ttl, 1.0 - n);
    });
}

fn update_smoke(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.drift(&mut *ctx.rng);
    s.emit_continuous(ctx, delta, |s, rng, p| {
        let r = &s.recipe;
        let o = drift_offset(s.angle, r.min_dp.x);
        p.pos = s.pos + s.random_offset(rng) + o;
        p.dp = Vec2::new(o.x * r.max_dp.x, -range(rng, r.min_dp.y, r.max_dp.y));

        let n = unit(rng);
        p.size = lerp(r.min_size, r.max_size, n);
        p.color = r.colors[0];
        p.dc = r.dc * (0.25 + n);
        p.ttl = lerp(r.min_ttl, r.max_ttl, 1.0 - n);
    });
}

fn update_fountain(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.drift(&mut *ctx.rng);
    s.emit_continuous(ctx, delta, |s, rng, p| {
        let r = &s.recipe;
        let max_v = r.max_dp.y * (1.0 + 0.25 * s.age.cos());
        let o = drift_offset(s.angle, r.max_dp.x);
        p.pos = s.pos + s.random_offset(rng) + o;
        p.dp = Vec2::new(o.x, -range(rng, r.min_dp.y, max_v));
        random_look(s, rng, p);
    });
}

fn update_explosion(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    let elapsed = s.burst_timer;
    s.burst_timer += delta;

    let Some(target) = s.target() else { return };
    if s.bursts > 0 && (s.repeat_interval <= 0.0 || elapsed < s.repeat_interval) {
        return;
    }
    let Ok(mut sink) = target.try_borrow_mut() else {
        log::warn!("particle layer is busy, delaying explosion");
        return;
    };

    s.burst_timer = delta;
    s.bursts += 1;

    let count = s.recipe.rate.max(0.0).floor() as usize;
    for _ in 0..count {
        let spawned = s.spawn(ctx, &mut *sink, |s, rng, p| {
            radial_motion(s, rng, p);
            faded_look(s, rng, p);
        });
        if !spawned {
            break;
        }
    }
}

fn update_spiral(s: &mut EmitterState, ctx: &mut EmitCtx<'_>, delta: f32) {
    s.angle += s.recipe.min_dp.y * delta;
    s.emit_continuous(ctx, delta, |s, rng, p| {
        let r = &s.recipe;
        let o = Vec2::new(0.0, 1.0).rotate(s.angle);
        p.pos = s.pos + o * r.min_dp.x + s.random_offset(rng);
        p.dp = Vec2::new(r.max_dp.x * o.x, r.max_dp.y * o.y);
        faded_look(s, rng, p);
    });
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::particles::ParticleHandle;

    type Layer = Rc<RefCell<Vec<ParticleHandle>>>;

    fn layer() -> Layer {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn run(em: &mut Emitter, pm: &mut ParticleManager, rng: &mut StdRng, steps: usize, d: f32) {
        for _ in 0..steps {
            em.update(pm, rng, d);
        }
    }

    fn linear(rate: f32) -> Recipe {
        Recipe::new(EmitterKind::Linear)
            .with_rate(rate)
            .with_ttl(100.0, 100.0)
            .with_velocity(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn rate_times_time_particles_regardless_of_step() {
        for (steps, d) in [(8, 0.125), (4, 0.25), (2, 0.5), (1, 1.0)] {
            let mut pm = ParticleManager::new(1000);
            let mut rng = StdRng::seed_from_u64(1);
            let l = layer();
            let mut em = Emitter::new(linear(100.0)).with_target(&l);
            run(&mut em, &mut pm, &mut rng, steps, d);
            assert_eq!(l.borrow().len(), 100, "step {d}");
            assert_eq!(pm.len(), 100);
        }
    }

    #[test]
    fn inexact_steps_still_emit_floor_of_rate_times_time() {
        let cases: [(f32, usize, f32); 5] = [
            (7.0, 10, 0.1),
            (13.0, 100, 0.01),
            (33.0, 10, 0.1),
            (100.0, 60, 1.0 / 60.0),
            (30.0, 144, 1.0 / 144.0),
        ];
        for (rate, steps, d) in cases {
            let mut pm = ParticleManager::new(1000);
            let mut rng = StdRng::seed_from_u64(1);
            let l = layer();
            let mut em = Emitter::new(linear(rate)).with_target(&l);
            run(&mut em, &mut pm, &mut rng, steps, d);
            assert_eq!(l.borrow().len(), rate as usize, "rate {rate} step {d}");
        }
    }

    #[test]
    fn jittered_frame_times_emit_floor_of_rate_times_time() {
        // Sums to one second.
        let frames = [0.016, 0.017, 0.033, 0.008, 0.026].repeat(10);
        for rate in [7.0, 60.0, 100.0] {
            let mut pm = ParticleManager::new(1000);
            let mut rng = StdRng::seed_from_u64(3);
            let l = layer();
            let mut em = Emitter::new(linear(rate)).with_target(&l);
            for &d in &frames {
                em.update(&mut pm, &mut rng, d);
            }
            assert_eq!(l.borrow().len(), rate as usize, "rate {rate}");
        }
    }

    #[test]
    fn fractional_rate_accumulates() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(1);
        let l = layer();
        let mut em = Emitter::new(linear(2.0)).with_target(&l);
        em.update(&mut pm, &mut rng, 0.25);
        assert!(l.borrow().is_empty());
        assert_eq!(em.state().accumulator, 0.5);
        em.update(&mut pm, &mut rng, 0.25);
        assert_eq!(l.borrow().len(), 1);
        assert_eq!(em.state().accumulator, 0.0);
    }

    #[test]
    fn without_layer_accumulator_is_preserved() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(1);
        let mut em = Emitter::new(linear(10.0));
        em.update(&mut pm, &mut rng, 0.5);
        assert!(pm.is_empty());
        assert_eq!(em.state().accumulator, 5.0);
        assert_eq!(em.state().age, 0.5);

        let l = layer();
        em.set_target_layer(&l);
        em.update(&mut pm, &mut rng, 0.0);
        assert_eq!(l.borrow().len(), 5);
    }

    #[test]
    fn dropped_layer_stops_emission() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(1);
        let l = layer();
        let mut em = Emitter::new(linear(10.0)).with_target(&l);
        drop(l);
        em.update(&mut pm, &mut rng, 1.0);
        assert!(pm.is_empty());
        assert!(em.state().target().is_none());
    }

    #[test]
    fn exhausted_pool_stops_and_keeps_remainder() {
        let mut pm = ParticleManager::with_config(
            crate::particles::ParticleConfig::default()
                .with_capacity(3)
                .with_recycling(false),
        );
        let mut rng = StdRng::seed_from_u64(1);
        let l = layer();
        let mut em = Emitter::new(linear(10.0)).with_target(&l);
        em.update(&mut pm, &mut rng, 0.5);
        assert_eq!(l.borrow().len(), 3);
        assert_eq!(em.state().accumulator, 2.0);
    }

    #[test]
    fn populated_particles_follow_recipe() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(9);
        let l = layer();
        let recipe = linear(20.0).with_size(2.0, 3.0);
        let mut em = Emitter::new(recipe)
            .with_position(Vec2::new(10.0, 20.0))
            .with_mirror_offset(5.0)
            .with_target(&l);
        em.update(&mut pm, &mut rng, 1.0);

        for &h in l.borrow().iter() {
            let p = pm.get(h).unwrap();
            assert_eq!(p.pos, Vec2::new(10.0, 20.0));
            assert_eq!(p.ry, 25.0);
            assert!((2.0..=3.0).contains(&p.size));
            assert!((-1.0..=1.0).contains(&p.dp.x));
            assert!(p.flags.contains(ParticleFlags::ALIVE | ParticleFlags::LINEAR));
        }
    }

    #[test]
    fn uniform_needs_two_offsets() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(2);
        let l = layer();
        let recipe = Recipe { kind: EmitterKind::Uniform, ..linear(10.0) };
        let mut em = Emitter::new(recipe)
            .with_offsets(vec![Vec2::new(-5.0, -5.0)])
            .with_target(&l);
        em.update(&mut pm, &mut rng, 1.0);
        assert!(l.borrow().is_empty());

        em.state_mut().offsets.push(Vec2::new(5.0, 5.0));
        em.update(&mut pm, &mut rng, 0.0);
        assert_eq!(l.borrow().len(), 10);
        for &h in l.borrow().iter() {
            let p = pm.get(h).unwrap();
            assert!(p.pos.x.abs() <= 5.0 && p.pos.y.abs() <= 5.0);
        }
    }

    #[test]
    fn layered_velocity_tracks_color_layer() {
        let mut pm = ParticleManager::new(100);
        let mut rng = StdRng::seed_from_u64(4);
        let l = layer();
        let mut em = Emitter::new(Recipe::SNOW)
            .with_offsets(vec![Vec2::new(-100.0, -10.0), Vec2::new(100.0, 0.0)])
            .with_target(&l);
        em.update(&mut pm, &mut rng, 1.0);
        assert_eq!(l.borrow().len(), 40);

        let colors = Recipe::SNOW.colors;
        for &h in l.borrow().iter() {
            let p = pm.get(h).unwrap();
            let z = colors.iter().position(|c| *c == p.color).unwrap();
            let expected = if z >= 2 { Recipe::SNOW.min_dp } else { Recipe::SNOW.max_dp };
            assert_eq!(p.dp, expected);
            assert_eq!(p.size.fract(), 0.0);
        }
    }

    #[test]
    fn radial_speed_within_range() {
        let mut pm = ParticleManager::new(200);
        let mut rng = StdRng::seed_from_u64(5);
        let l = layer();
        let recipe = Recipe { kind: EmitterKind::Radial, ..linear(50.0) }
            .with_velocity(Vec2::new(0.0, 10.0), Vec2::new(0.0, 20.0));
        let mut em = Emitter::new(recipe).with_target(&l);
        em.update(&mut pm, &mut rng, 1.0);
        for &h in l.borrow().iter() {
            let speed = pm.get(h).unwrap().dp.length();
            assert!((10.0 - 1e-3..=20.0 + 1e-3).contains(&speed));
        }
    }

    #[test]
    fn flame_rises_and_drifts_within_bounds() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(6);
        let l = layer();
        let mut em = Emitter::new(Recipe::FLAME).with_target(&l);
        em.update(&mut pm, &mut rng, 0.125);
        assert_eq!(l.borrow().len(), 50);
        assert!(em.state().angle.abs() <= 0.25);
        for &h in l.borrow().iter() {
            let p = pm.get(h).unwrap();
            assert!(p.dp.y <= -25.0 && p.dp.y >= -40.0);
            assert!(p.pos.x.abs() <= Recipe::FLAME.min_dp.x + 1e-4);
            assert!(p.ttl >= 1.0 && p.ttl <= 5.0);
        }
    }

    #[test]
    fn smoke_scales_decay() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(8);
        let l = layer();
        let mut em = Emitter::new(Recipe::SMOKE).with_target(&l);
        em.update(&mut pm, &mut rng, 0.5);
        for &h in l.borrow().iter() {
            let a = pm.get(h).unwrap().dc.a;
            assert!(a <= -0.5 * 0.25 + 1e-6 && a >= -0.5 * 1.25 - 1e-6);
        }
    }

    #[test]
    fn fountain_particles_fall_back() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(10);
        let l = layer();
        let mut em = Emitter::new(Recipe::FOUNTAIN).with_target(&l);
        em.update(&mut pm, &mut rng, 0.25);
        let h = l.borrow()[0];
        assert!(pm.get(h).unwrap().dp.y < 0.0);
        assert!(pm.get(h).unwrap().flags.contains(ParticleFlags::GRAVITATIONAL));
        let before = pm.get(h).unwrap().dp.y;
        pm.update(0.5);
        assert!(pm.get(h).unwrap().dp.y > before);
    }

    #[test]
    fn explosion_bursts_then_waits_for_interval() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(11);
        let l = layer();
        let mut em = Emitter::new(Recipe::EXPLOSION.with_rate(10.0))
            .with_repeat_interval(1.0)
            .with_target(&l);

        em.update(&mut pm, &mut rng, 0.25);
        assert_eq!(l.borrow().len(), 10);

        for _ in 0..3 {
            em.update(&mut pm, &mut rng, 0.25);
            assert_eq!(l.borrow().len(), 10);
        }

        em.update(&mut pm, &mut rng, 0.25);
        assert_eq!(l.borrow().len(), 20);
        assert_eq!(em.state().bursts(), 2);
    }

    #[test]
    fn explosion_without_repeat_fires_once() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(12);
        let l = layer();
        let mut em = Emitter::new(Recipe::EXPLOSION)
            .with_repeat_interval(0.0)
            .with_target(&l);
        run(&mut em, &mut pm, &mut rng, 40, 0.5);
        assert_eq!(l.borrow().len(), 100);
        for &h in l.borrow().iter().take(5) {
            if let Some(p) = pm.get(h) {
                assert!(p.flags.contains(ParticleFlags::DAMPENED));
            }
        }
    }

    #[test]
    fn spiral_rotates_without_layer() {
        let mut pm = ParticleManager::new(10);
        let mut rng = StdRng::seed_from_u64(13);
        let mut em = Emitter::new(Recipe::SPIRAL);
        em.update(&mut pm, &mut rng, 0.5);
        assert_eq!(em.state().angle, Recipe::SPIRAL.min_dp.y * 0.5);
        assert!(pm.is_empty());
    }

    #[test]
    fn ttl_deactivates_emitter() {
        let mut pm = ParticleManager::new(1000);
        let mut rng = StdRng::seed_from_u64(14);
        let l = layer();
        let mut em = Emitter::new(linear(4.0)).with_ttl(1.0).with_target(&l);
        run(&mut em, &mut pm, &mut rng, 4, 0.25);
        assert!(!em.is_active());
        let emitted = l.borrow().len();
        run(&mut em, &mut pm, &mut rng, 4, 0.25);
        assert_eq!(l.borrow().len(), emitted);
        assert_eq!(em.state().age, 1.0);
    }

    #[test]
    fn custom_update_gets_state_and_context() {
        let mut pm = ParticleManager::new(10);
        let mut rng = StdRng::seed_from_u64(15);
        let l = layer();
        let mut em = Emitter::custom(linear(0.0), |s, ctx, delta| {
            s.angle += delta;
            if let Some(target) = s.target() {
                let mut sink = target.borrow_mut();
                s.spawn(ctx, &mut *sink, |_, _, p| p.ttl = 1.0);
            }
        })
        .with_target(&l);

        em.update(&mut pm, &mut rng, 0.5);
        em.update(&mut pm, &mut rng, 0.5);
        assert_eq!(em.kind(), EmitterKind::Custom);
        assert_eq!(em.state().angle, 1.0);
        assert_eq!(l.borrow().len(), 2);
    }
}
