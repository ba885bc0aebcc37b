use std::cell::RefCell;
use std::rc::Rc;

use nergal_engine::camera::ShakeEffect;
use nergal_engine::coords::Vec2;
use nergal_engine::particles::{Emitter, ParticleLayer, Recipe};
use nergal_engine::render::MeshGroup;
use nergal_engine::scene::{Scene, World};

type Layer = Rc<RefCell<ParticleLayer>>;

/// Emitters feeding a single layer; the shared shape of every demo scene.
struct Emitters {
    layer: Layer,
    emitters: Vec<Emitter>,
}

impl Emitters {
    fn new(layer: ParticleLayer) -> Self {
        Self {
            layer: Rc::new(RefCell::new(layer)),
            emitters: Vec::new(),
        }
    }

    fn push(&mut self, mut emitter: Emitter) {
        emitter.set_target_layer(&self.layer);
        self.emitters.push(emitter);
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        for emitter in &mut self.emitters {
            emitter.update(&mut world.particles, &mut world.rng, delta);
        }
    }

    fn reset(&mut self, world: &mut World) {
        world.particles.clear();
        self.layer.borrow_mut().clear();
    }

    fn groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup> {
        let bounds = world.camera.bounds();
        self.layer.borrow_mut().sync(&world.particles, Some(bounds));
        vec![&mut self.layer as &mut dyn MeshGroup]
    }
}

// ── fire ───────────────────────────────────────────────────────────────────

pub struct FireScene(Emitters);

impl FireScene {
    pub fn new() -> Self {
        let mut fx = Emitters::new(ParticleLayer::default().with_reflection(0.35));
        for x in [-120.0, 0.0, 120.0] {
            fx.push(
                Emitter::new(Recipe::FLAME)
                    .with_position(Vec2::new(x, 40.0))
                    .with_offsets(vec![Vec2::new(-8.0, 0.0), Vec2::new(8.0, 0.0)])
                    .with_mirror_offset(4.0),
            );
        }
        fx.push(Emitter::new(Recipe::SMOKE.with_rate(20.0)).with_position(Vec2::new(0.0, -20.0)));
        Self(fx)
    }
}

impl Scene for FireScene {
    fn activate(&mut self, world: &mut World) {
        self.0.reset(world);
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        self.0.update(world, delta);
    }

    fn mesh_groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup> {
        self.0.groups(world)
    }
}

// ── fountain ───────────────────────────────────────────────────────────────

pub struct FountainScene(Emitters);

impl FountainScene {
    pub fn new() -> Self {
        let mut fx = Emitters::new(ParticleLayer::default());
        fx.push(Emitter::new(Recipe::FOUNTAIN).with_position(Vec2::new(0.0, 150.0)));
        Self(fx)
    }
}

impl Scene for FountainScene {
    fn activate(&mut self, world: &mut World) {
        self.0.reset(world);
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        self.0.update(world, delta);
    }

    fn mesh_groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup> {
        self.0.groups(world)
    }
}

// ── fireworks ──────────────────────────────────────────────────────────────

/// Repeating explosions that shake the camera on every burst, plus a spiral.
pub struct FireworksScene {
    fx: Emitters,
    bursts: u32,
}

impl FireworksScene {
    pub fn new() -> Self {
        let mut fx = Emitters::new(ParticleLayer::default());
        fx.push(
            Emitter::new(Recipe::EXPLOSION)
                .with_position(Vec2::new(-100.0, -60.0))
                .with_repeat_interval(2.0),
        );
        fx.push(
            Emitter::new(Recipe::EXPLOSION.with_rate(150.0))
                .with_position(Vec2::new(110.0, -20.0))
                .with_repeat_interval(3.0),
        );
        fx.push(Emitter::new(Recipe::SPIRAL.with_rate(60.0)).with_position(Vec2::new(0.0, 80.0)));
        Self { fx, bursts: 0 }
    }

    fn total_bursts(&self) -> u32 {
        self.fx.emitters.iter().map(|e| e.state().bursts()).sum()
    }
}

impl Scene for FireworksScene {
    fn activate(&mut self, world: &mut World) {
        self.fx.reset(world);
        self.bursts = self.total_bursts();
    }

    fn deactivate(&mut self, world: &mut World) {
        world.camera.clear_effect();
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        self.fx.update(world, delta);

        let bursts = self.total_bursts();
        if bursts > self.bursts {
            world.camera.set_effect(ShakeEffect::new(0.4, 30.0, 1.0, 4.0));
        }
        self.bursts = bursts;
    }

    fn mesh_groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup> {
        self.fx.groups(world)
    }
}

// ── snow ───────────────────────────────────────────────────────────────────

pub struct SnowScene(Emitters);

impl SnowScene {
    pub fn new() -> Self {
        let mut fx = Emitters::new(ParticleLayer::default());
        fx.push(
            Emitter::new(Recipe::SNOW)
                .with_position(Vec2::new(0.0, -190.0))
                .with_offsets(vec![Vec2::new(-320.0, -10.0), Vec2::new(320.0, 0.0)]),
        );
        Self(fx)
    }
}

impl Scene for SnowScene {
    fn activate(&mut self, world: &mut World) {
        self.0.reset(world);
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        self.0.update(world, delta);
    }

    fn mesh_groups<'a>(&'a mut self, world: &World) -> Vec<&'a mut dyn MeshGroup> {
        self.0.groups(world)
    }
}
