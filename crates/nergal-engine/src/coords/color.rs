use core::ops::{Add, AddAssign, Mul, Sub};

use crate::paint::Color;

/// Straight-alpha linear RGBA color.
///
/// Particle colors and recipe seed colors live in this space so that per-second
/// decay can be applied channel by channel. Conversion to premultiplied [`Color`]
/// happens when instances are written for the GPU.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Builds a color from a packed `0xRRGGBBAA` literal.
    #[inline]
    pub const fn from_rgba_u32(rgba: u32) -> Self {
        Self::new(
            ((rgba >> 24) & 0xff) as f32 / 255.0,
            ((rgba >> 16) & 0xff) as f32 / 255.0,
            ((rgba >> 8) & 0xff) as f32 / 255.0,
            (rgba & 0xff) as f32 / 255.0,
        )
    }

    /// Converts to premultiplied alpha, clamping every channel into `[0, 1]`.
    #[inline]
    pub fn premultiplied(self) -> Color {
        Color::from_straight(self.r, self.g, self.b, self.a)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl Add for ColorRgba {
    type Output = ColorRgba;
    #[inline]
    fn add(self, rhs: ColorRgba) -> ColorRgba {
        ColorRgba::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl AddAssign for ColorRgba {
    #[inline]
    fn add_assign(&mut self, rhs: ColorRgba) {
        *self = *self + rhs;
    }
}

impl Sub for ColorRgba {
    type Output = ColorRgba;
    #[inline]
    fn sub(self, rhs: ColorRgba) -> ColorRgba {
        ColorRgba::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b, self.a - rhs.a)
    }
}

impl Mul<f32> for ColorRgba {
    type Output = ColorRgba;
    #[inline]
    fn mul(self, rhs: f32) -> ColorRgba {
        ColorRgba::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_literal_unpacks_channels() {
        let c = ColorRgba::from_rgba_u32(0xff0080c0);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 128.0 / 255.0).abs() < 1e-6);
        assert!((c.a - 192.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn premultiply_clamps_decayed_channels() {
        let c = ColorRgba::new(1.5, -0.2, 0.5, 0.5).premultiplied();
        assert_eq!(c.r, 0.5);
        assert_eq!(c.g, 0.0);
        assert_eq!(c.b, 0.25);
        assert_eq!(c.a, 0.5);
    }
}
