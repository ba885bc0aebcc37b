use super::Vec2;

/// Axis-aligned box in world units.
///
/// Used for camera bounds and particle culling. Unlike a widget rect the box is
/// closed on both ends: points on the max edge are inside.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    /// Builds a box from two corners given in any order.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Builds a box of `size` centred on `center`.
    #[inline]
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    /// Grows the box by `margin` on every side.
    #[inline]
    pub fn expanded(self, margin: f32) -> Self {
        let m = Vec2::new(margin, margin);
        Self { min: self.min - m, max: self.max + m }
    }

    #[inline]
    pub fn translated(self, offset: Vec2) -> Self {
        Self { min: self.min + offset, max: self.max + offset }
    }

    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let min = Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Vec2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        let r = Rect { min, max };
        if r.is_empty() { None } else { Some(r) }
    }
}
