//! Scenes and the stack that decides which one runs.
//!
//! Only the top scene is updated and rendered. Scenes share one [`World`]
//! holding the particle pool, the camera and the random source.

mod stack;
mod world;

pub use stack::{Scene, SceneStack};
pub use world::World;
