mod scenes;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use nergal_engine::config::EngineConfig;
use nergal_engine::core::{App, AppControl, FrameCtx};
use nergal_engine::device::GpuInit;
use nergal_engine::events::Messenger;
use nergal_engine::game::Game;
use nergal_engine::logging::{init_logging, LoggingConfig};
use nergal_engine::render::shaders::{FX_BLUR, FX_SCANLINES};
use nergal_engine::render::{EffectParam, Renderer};
use nergal_engine::window::{Runtime, RuntimeConfig};

use scenes::{FireScene, FireworksScene, FountainScene, SnowScene};

const SCENES: [(KeyCode, &str); 4] = [
    (KeyCode::Digit1, "fire"),
    (KeyCode::Digit2, "fountain"),
    (KeyCode::Digit3, "fireworks"),
    (KeyCode::Digit4, "snow"),
];

/// Keyboard front-end over [`Game`].
struct Demo {
    game: Game,
}

impl Demo {
    fn new(config: EngineConfig) -> Self {
        let mut game = Game::new(config).with_setup(|setup| {
            let blur = Renderer::load_effect(setup.render, setup.shaders, FX_BLUR)?
                .with_param("direction", EffectParam::vec2(1.0, 0.0));
            let scanlines = Renderer::load_effect(setup.render, setup.shaders, FX_SCANLINES)?
                .with_param("lines", EffectParam::vec2(240.0, 0.35));
            setup.renderer.add_effect(0, blur);
            setup.renderer.add_effect(1, scanlines);
            setup.renderer.set_composite_scale(1.0);
            Ok(())
        });

        game.add_scene("fire", FireScene::new());
        game.add_scene("fountain", FountainScene::new());
        game.add_scene("fireworks", FireworksScene::new());
        game.add_scene("snow", SnowScene::new());
        game.push_scene("fire");
        Self { game }
    }

    fn on_key(&mut self, code: KeyCode, messenger: &mut Messenger) -> AppControl {
        if let Some((_, id)) = SCENES.iter().find(|(key, _)| *key == code) {
            self.game.switch_scene(id);
            return AppControl::Continue;
        }

        match code {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::F1 => self.game.toggle_debug(messenger),
            KeyCode::KeyE => {
                if let Some(renderer) = self.game.renderer_mut() {
                    let enabled = !renderer.effects_enabled();
                    renderer.set_effects_enabled(enabled);
                    log::info!("post effects {}", if enabled { "on" } else { "off" });
                }
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for Demo {
    fn on_attach(&mut self, window_id: WindowId, messenger: &mut Messenger) {
        self.game.on_attach(window_id, messenger);
    }

    fn on_window_event(
        &mut self,
        _window_id: WindowId,
        event: &WindowEvent,
        messenger: &mut Messenger,
    ) -> AppControl {
        let WindowEvent::KeyboardInput { event: key, .. } = event else {
            return AppControl::Continue;
        };
        if key.state != ElementState::Pressed || key.repeat {
            return AppControl::Continue;
        }
        match key.physical_key {
            PhysicalKey::Code(code) => self.on_key(code, messenger),
            PhysicalKey::Unidentified(_) => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.game.on_frame(ctx)
    }
}

fn main() -> Result<()> {
    let level = std::env::var("NERGAL_LOG").unwrap_or_else(|_| "info".to_string());
    init_logging(LoggingConfig::default().with_level(&level)?);

    let config = EngineConfig::default()
        .with_camera_size(640.0, 360.0)
        .with_particle_capacity(4000);

    log::info!("keys: 1-4 scenes, E effects, F1 debug, Esc quit");
    Runtime::run(
        RuntimeConfig::default().with_title("nergal particles"),
        GpuInit::default(),
        Demo::new(config),
    )
}
