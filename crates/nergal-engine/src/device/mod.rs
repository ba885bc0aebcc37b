//! GPU device and surface ownership.
//!
//! One [`Gpu`] exists per window. It owns the wgpu device, queue and the
//! configured surface, and hands out one [`GpuFrame`] per rendered frame.

mod error;
mod frame;
mod gpu;
#[cfg(test)]
pub(crate) mod headless;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
