//! winit event loop and per-window state.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
