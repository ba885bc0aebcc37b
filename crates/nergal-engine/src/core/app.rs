use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::events::Messenger;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Callbacks the runtime invokes, in order: `on_attach` once per window, then
/// `on_window_event` and `on_frame` for as long as the window lives.
pub trait App {
    /// The window exists and its GPU context is ready. Subscribe here.
    fn on_attach(&mut self, window_id: WindowId, messenger: &mut Messenger) {
        let _ = (window_id, messenger);
    }

    fn on_window_event(
        &mut self,
        window_id: WindowId,
        event: &WindowEvent,
        messenger: &mut Messenger,
    ) -> AppControl {
        let _ = (window_id, event, messenger);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
