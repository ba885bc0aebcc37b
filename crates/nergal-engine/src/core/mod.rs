//! Contract between the platform runtime and the code it drives.
//!
//! The runtime owns windows, GPU contexts and the [`Messenger`](crate::events::Messenger);
//! an [`App`] only ever sees them through the per-frame [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
