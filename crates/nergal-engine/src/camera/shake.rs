use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::coords::Vec2;
use crate::particles::random::range;

use super::camera2::{CameraEffect, CameraTransform2};

/// Screen shake: jumps the camera offset `frequency` times per second for
/// `duration` seconds, alternating the vertical direction on every jump.
#[derive(Debug)]
pub struct ShakeEffect {
    duration: f32,
    frequency: f32,
    min_range: f32,
    max_range: f32,
    sign_y: f32,
    next_jump: f32,
    elapsed: f32,
    rng: StdRng,
}

impl ShakeEffect {
    pub fn new(duration: f32, frequency: f32, min_range: f32, max_range: f32) -> Self {
        Self::with_rng(duration, frequency, min_range, max_range, StdRng::from_entropy())
    }

    pub fn with_rng(
        duration: f32,
        frequency: f32,
        min_range: f32,
        max_range: f32,
        rng: StdRng,
    ) -> Self {
        Self {
            duration,
            frequency,
            min_range,
            max_range,
            sign_y: 1.0,
            next_jump: 0.0,
            elapsed: 0.0,
            rng,
        }
    }
}

impl CameraEffect for ShakeEffect {
    fn update_transform(&mut self, delta: f32, tx: &mut CameraTransform2) {
        self.elapsed += delta;
        if self.is_done() {
            tx.offset = Vec2::zero();
            return;
        }

        self.next_jump -= delta;
        if self.next_jump > 0.0 {
            return;
        }
        self.next_jump = if self.frequency > 0.0 { 1.0 / self.frequency } else { self.duration };

        let x = range(&mut self.rng, -self.max_range, self.max_range);
        let y = range(&mut self.rng, self.min_range, self.max_range) * self.sign_y;
        tx.offset = Vec2::new(x, y);
        self.sign_y = -self.sign_y;
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> CameraTransform2 {
        CameraTransform2 {
            position: Vec2::zero(),
            dimension: Vec2::new(100.0, 100.0),
            offset: Vec2::zero(),
        }
    }

    #[test]
    fn jumps_alternate_vertically_within_range() {
        let mut shake = ShakeEffect::with_rng(1.0, 10.0, 2.0, 4.0, StdRng::seed_from_u64(3));
        let mut t = tx();

        shake.update_transform(0.01, &mut t);
        let first = t.offset;
        assert!(first.y >= 2.0 && first.y <= 4.0);
        assert!(first.x.abs() <= 4.0);

        // Next jump only after 1 / frequency seconds.
        shake.update_transform(0.05, &mut t);
        assert_eq!(t.offset, first);
        shake.update_transform(0.06, &mut t);
        assert!(t.offset.y <= -2.0 && t.offset.y >= -4.0);
    }

    #[test]
    fn ends_after_duration() {
        let mut shake = ShakeEffect::with_rng(0.5, 20.0, 1.0, 2.0, StdRng::seed_from_u64(1));
        let mut t = tx();
        for _ in 0..4 {
            shake.update_transform(0.125, &mut t);
        }
        assert!(shake.is_done());
        assert_eq!(t.offset, Vec2::zero());
    }
}
