//! 2D orthographic camera and camera effects.

mod camera2;
mod shake;

pub use camera2::{Camera2, CameraEffect, CameraTransform2};
pub use shake::ShakeEffect;
