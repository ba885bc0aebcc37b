//! nergal engine crate.
//!
//! A small 2D engine built around a pooled particle system and a multi-pass
//! wgpu renderer with a ping-pong post-processing chain.
//!
//! Layering, bottom up: `coords`/`paint` value types, `particles` simulation,
//! `assets` caches and `render` passes, then `scene`, `game` and the winit
//! `window` runtime on top.

pub mod assets;
pub mod camera;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod events;
pub mod game;
pub mod logging;
pub mod paint;
pub mod particles;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
