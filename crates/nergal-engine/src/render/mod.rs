//! GPU rendering subsystem.
//!
//! [`Renderer`] owns the frame: framebuffers, per-frame globals, the effect
//! chain and the composite pass. Mesh groups own their own pipelines and
//! buffers and record into the passes the renderer opens for them.
//!
//! Convention:
//! - world geometry is in world units (+Y down), converted to clip space by
//!   the camera uniform at group 0, binding 0.

mod common;
mod ctx;
mod effect;
mod framebuffer;
mod globals;
mod group;
mod particles;
mod plan;
mod renderer;
pub mod shaders;

pub use ctx::{PassInfo, RenderCtx, RenderTarget};
pub use effect::{Effect, EffectParam, EffectParams, EffectUniform, MAX_EFFECT_PARAMS};
pub use framebuffer::{DepthBuffer, FrameBuffer, DEPTH_FORMAT};
pub use globals::{CameraUniform, FrameGlobals, Light};
pub use group::{MeshGroup, RenderStage};
pub use particles::{ParticleInstance, ParticleRenderer};
pub use plan::{plan_frame, Pass, SceneTarget, Slot};
pub use renderer::{Renderer, RendererConfig};
