//! GPU-facing color representation (linear, premultiplied alpha).
//!
//! Simulation code works in straight alpha ([`crate::coords::ColorRgba`]); values
//! cross into this module only when they are written to instance buffers or used
//! as clear colors.

pub mod color;

pub use color::Color;
