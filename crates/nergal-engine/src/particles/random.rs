//! Inclusive-range draws shared by the emitter kinds.

use rand::{Rng, RngCore};

use crate::coords::Vec2;

/// Uniform value in `[a, b]`; the endpoints may come in either order.
pub(crate) fn range(rng: &mut dyn RngCore, a: f32, b: f32) -> f32 {
    if a == b || !(a.is_finite() && b.is_finite()) {
        return a;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    rng.gen_range(lo..=hi)
}

pub(crate) fn vec_range(rng: &mut dyn RngCore, a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(range(rng, a.x, b.x), range(rng, a.y, b.y))
}

/// Whole-number value in `[a, b]`, returned as a float.
pub(crate) fn int_range(rng: &mut dyn RngCore, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let (lo, hi) = (lo.round() as i32, hi.round() as i32);
    rng.gen_range(lo..=hi) as f32
}

pub(crate) fn unit(rng: &mut dyn RngCore) -> f32 {
    rng.gen_range(0.0..=1.0)
}

/// Index into a collection of `len` items; `len` must be non-zero.
pub(crate) fn index(rng: &mut dyn RngCore, len: usize) -> usize {
    rng.gen_range(0..len)
}

#[inline]
pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn reversed_endpoints_are_accepted() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = range(&mut rng, 5.0, -5.0);
            assert!((-5.0..=5.0).contains(&v));
        }
    }

    #[test]
    fn degenerate_range_returns_endpoint() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(range(&mut rng, 3.0, 3.0), 3.0);
    }

    #[test]
    fn int_range_is_whole() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let v = int_range(&mut rng, 1.0, 3.0);
            assert_eq!(v.fract(), 0.0);
            assert!((1.0..=3.0).contains(&v));
        }
    }
}
