//! [`Game`]: the stock [`App`] that ties scenes, particles, the camera and the
//! renderer together.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use winit::window::WindowId;

use crate::assets::{ShaderCache, TextureCache};
use crate::camera::Camera2;
use crate::config::EngineConfig;
use crate::core::{App, AppControl, FrameCtx};
use crate::events::{Event, Message, Messenger, Payload, RecipientId};
use crate::render::{RenderCtx, Renderer};
use crate::scene::{Scene, SceneStack, World};

/// Seconds between debug statistics lines.
const DEBUG_INTERVAL: f32 = 1.0;

/// Handed to the setup hook once the GPU is available.
pub struct SetupCtx<'a> {
    pub render: &'a RenderCtx<'a>,
    pub renderer: &'a mut Renderer,
    pub shaders: &'a mut ShaderCache,
    pub textures: &'a mut TextureCache,
    pub world: &'a mut World,
}

pub type SetupFn = Box<dyn FnOnce(&mut SetupCtx<'_>) -> Result<()>>;

type PendingResize = Rc<Cell<Option<(u32, u32)>>>;

pub struct Game {
    config: EngineConfig,
    world: World,
    scenes: SceneStack,
    shaders: ShaderCache,
    textures: TextureCache,
    renderer: Option<Renderer>,
    setup: Option<SetupFn>,
    recipient: Option<RecipientId>,
    pending_resize: PendingResize,
    debug_timer: f32,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("world", &self.world)
            .field("scenes", &self.scenes)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Game {
    pub fn new(config: EngineConfig) -> Self {
        let mut world = World::new(config.particles.clone(), Camera2::new(config.camera_size));
        if let Some(seed) = config.seed {
            world = world.with_seed(seed);
        }

        Self {
            shaders: ShaderCache::new(config.shader_dir.clone()),
            textures: TextureCache::new(config.texture_dir.clone()),
            world,
            scenes: SceneStack::new(),
            renderer: None,
            setup: None,
            recipient: None,
            pending_resize: PendingResize::default(),
            debug_timer: 0.0,
            config,
        }
    }

    /// Runs `f` right after the renderer is created (load effects, textures).
    pub fn with_setup(
        mut self,
        f: impl FnOnce(&mut SetupCtx<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.setup = Some(Box::new(f));
        self
    }

    // ── scenes ─────────────────────────────────────────────────────────────

    pub fn add_scene(&mut self, id: impl Into<String>, scene: impl Scene + 'static) {
        self.scenes.add_scene(id, scene);
    }

    pub fn push_scene(&mut self, id: &str) -> bool {
        self.scenes.push_scene(id, &mut self.world)
    }

    pub fn pop_scene(&mut self) -> Option<String> {
        self.scenes.pop_scene(&mut self.world)
    }

    /// Unwinds the stack and leaves `id` as the only scene.
    pub fn switch_scene(&mut self, id: &str) -> bool {
        let switched = self.scenes.replace_all(id, &mut self.world);
        if switched {
            self.world.particles.clear();
        }
        switched
    }

    pub fn scenes(&self) -> &SceneStack {
        &self.scenes
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// `None` until the first frame has been rendered.
    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderCache {
        &mut self.shaders
    }

    pub fn textures_mut(&mut self) -> &mut TextureCache {
        &mut self.textures
    }

    /// Flips debug mode and announces it.
    pub fn toggle_debug(&mut self, messenger: &mut Messenger) {
        self.world.debug = !self.world.debug;
        self.debug_timer = 0.0;
        messenger.trigger(&Message::with_payload(
            Event::ToggleDebug,
            Payload::Flag(self.world.debug),
        ));
    }

    // ── frame ──────────────────────────────────────────────────────────────

    /// Advances the top scene, then the particle pool, then the camera.
    pub fn update(&mut self, delta: f32) {
        if let Some(scene) = self.scenes.top_mut() {
            scene.update(&mut self.world, delta);
        }
        self.world.particles.update(delta);
        self.world.camera.update(delta);

        if self.world.debug {
            self.debug_timer += delta;
            if self.debug_timer >= DEBUG_INTERVAL {
                self.debug_timer -= DEBUG_INTERVAL;
                log::info!(
                    "scene {:?}: {} / {} particles",
                    self.scenes.top_id(),
                    self.world.particles.len(),
                    self.world.particles.capacity()
                );
            }
        }
    }

    fn ensure_renderer(&mut self, ctx: &FrameCtx<'_, '_>) -> Result<()> {
        if self.renderer.is_some() {
            return Ok(());
        }

        let rctx = ctx.render_ctx();
        let mut renderer = Renderer::new(&rctx, &mut self.shaders, self.config.renderer.clone())
            .context("failed to create renderer")?;

        if let Some(setup) = self.setup.take() {
            let mut setup_ctx = SetupCtx {
                render: &rctx,
                renderer: &mut renderer,
                shaders: &mut self.shaders,
                textures: &mut self.textures,
                world: &mut self.world,
            };
            setup(&mut setup_ctx).context("game setup failed")?;
        }

        self.renderer = Some(renderer);
        Ok(())
    }

    /// Resize messages are buffered and applied at the start of the next frame.
    fn subscribe(&mut self, messenger: &mut Messenger) {
        if self.recipient.is_some() {
            return;
        }
        let id = messenger.register();
        let pending = self.pending_resize.clone();
        messenger.subscribe(Event::WindowResized, id, move |msg| {
            if let Payload::Size { width, height } = msg.payload {
                pending.set(Some((width, height)));
            }
        });
        self.recipient = Some(id);
    }

    fn apply_resize(&mut self, ctx: &FrameCtx<'_, '_>) {
        let Some((width, height)) = self.pending_resize.take() else {
            return;
        };
        self.world.camera.resize(width, height);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(ctx.gpu.device(), width, height);
        }
    }
}

impl App for Game {
    fn on_attach(&mut self, _window_id: WindowId, messenger: &mut Messenger) {
        self.subscribe(messenger);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Err(err) = self.ensure_renderer(ctx) {
            log::error!("{err:#}");
            return AppControl::Exit;
        }
        self.apply_resize(ctx);

        // A scene switch restarts the clock for the incoming scene.
        let delta = if self.scenes.take_changed() { 0.0 } else { ctx.time.dt };
        self.update(delta);

        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Continue;
        };
        let camera = self.world.camera.uniform();
        let world = &self.world;
        let mut groups = match self.scenes.top_mut() {
            Some(scene) => scene.mesh_groups(world),
            None => Vec::new(),
        };

        ctx.render(|rctx, target| renderer.render(rctx, target, &camera, &mut groups))
    }
}
