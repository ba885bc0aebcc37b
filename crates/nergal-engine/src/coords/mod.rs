//! Coordinate and geometry types shared by the particle system, camera and renderers.
//!
//! Canonical world space:
//! - origin at the camera centre by default
//! - +X right, +Y down
//!
//! Renderers convert to clip space through the camera uniform.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
