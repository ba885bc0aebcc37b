use glam::{Mat4, Vec3};

use crate::coords::{Rect, Vec2};
use crate::render::CameraUniform;

/// Camera state effects are allowed to modify.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraTransform2 {
    /// World position at the centre of the view.
    pub position: Vec2,
    /// Logical size of the visible area in world units.
    pub dimension: Vec2,
    /// Transient offset added on top of `position` (screen shake).
    pub offset: Vec2,
}

/// Time-limited modifier applied to the camera transform every update.
pub trait CameraEffect {
    fn update_transform(&mut self, delta: f32, transform: &mut CameraTransform2);
    fn is_done(&self) -> bool;
}

/// Orthographic 2D camera centred on its position, +Y down.
///
/// A camera built with a non-zero dimension keeps it on resize; otherwise the
/// dimension follows the window size in pixels.
pub struct Camera2 {
    transform: CameraTransform2,
    fixed_dimension: bool,
    near_clip: f32,
    far_clip: f32,
    aspect_ratio: f32,
    proj: Mat4,
    view: Mat4,
    effect: Option<Box<dyn CameraEffect>>,
}

impl std::fmt::Debug for Camera2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera2")
            .field("transform", &self.transform)
            .field("fixed_dimension", &self.fixed_dimension)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

impl Default for Camera2 {
    fn default() -> Self {
        Self::new(Vec2::zero())
    }
}

impl Camera2 {
    pub const DEFAULT_NEAR_CLIP: f32 = 0.0;
    pub const DEFAULT_FAR_CLIP: f32 = 1000.0;

    pub fn new(dimension: Vec2) -> Self {
        let mut camera = Self {
            transform: CameraTransform2 {
                position: Vec2::zero(),
                dimension,
                offset: Vec2::zero(),
            },
            fixed_dimension: dimension.x != 0.0 && dimension.y != 0.0,
            near_clip: Self::DEFAULT_NEAR_CLIP,
            far_clip: Self::DEFAULT_FAR_CLIP,
            aspect_ratio: 1.0,
            proj: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            effect: None,
        };
        if camera.fixed_dimension {
            camera.rebuild_projection();
        }
        camera
    }

    /// Applies a new window size in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.fixed_dimension {
            self.transform.dimension = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        }
        self.rebuild_projection();
    }

    /// Runs the active effect and rebuilds the view matrix.
    pub fn update(&mut self, delta: f32) {
        if let Some(effect) = self.effect.as_mut() {
            effect.update_transform(delta, &mut self.transform);
            if effect.is_done() {
                self.effect = None;
                self.transform.offset = Vec2::zero();
            }
        }

        let eye = self.transform.position + self.transform.offset;
        self.view = Mat4::from_translation(Vec3::new(-eye.x, -eye.y, 0.0));
    }

    pub fn set_effect(&mut self, effect: impl CameraEffect + 'static) {
        self.effect = Some(Box::new(effect));
    }

    pub fn clear_effect(&mut self) {
        self.effect = None;
        self.transform.offset = Vec2::zero();
    }

    #[inline]
    pub fn has_effect(&self) -> bool {
        self.effect.is_some()
    }

    #[inline]
    pub fn transform(&self) -> &CameraTransform2 {
        &self.transform
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    #[inline]
    pub fn dimension(&self) -> Vec2 {
        self.transform.dimension
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_clip(&mut self, near: f32, far: f32) {
        self.near_clip = near;
        self.far_clip = far;
        self.rebuild_projection();
    }

    /// World-space area currently in view.
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.transform.position + self.transform.offset, self.transform.dimension)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            dimension: [self.transform.dimension.x, self.transform.dimension.y],
            _pad: [0.0; 2],
        }
    }

    fn rebuild_projection(&mut self) {
        let d = self.transform.dimension;
        self.aspect_ratio = if d.y != 0.0 { d.x / d.y } else { 1.0 };
        let (hw, hh) = (d.x * 0.5, d.y * 0.5);
        // bottom = +hh, top = -hh: world +Y points down the screen.
        self.proj = Mat4::orthographic_rh(-hw, hw, hh, -hh, self.near_clip, self.far_clip);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    fn project(camera: &Camera2, p: Vec2) -> Vec4 {
        camera.view_proj() * Vec4::new(p.x, p.y, 0.0, 1.0)
    }

    #[test]
    fn window_sized_camera_maps_edges_to_ndc() {
        let mut camera = Camera2::default();
        camera.resize(800, 600);
        camera.update(0.0);

        assert_eq!(camera.dimension(), Vec2::new(800.0, 600.0));
        let top_left = project(&camera, Vec2::new(-400.0, -300.0));
        assert!((top_left.x + 1.0).abs() < 1e-5);
        assert!((top_left.y - 1.0).abs() < 1e-5);
        let centre = project(&camera, Vec2::zero());
        assert!(centre.x.abs() < 1e-6 && centre.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&centre.z));
    }

    #[test]
    fn fixed_dimension_survives_resize() {
        let mut camera = Camera2::new(Vec2::new(320.0, 180.0));
        camera.resize(1920, 1200);
        assert_eq!(camera.dimension(), Vec2::new(320.0, 180.0));
        assert!((camera.aspect_ratio() - 16.0 / 9.0).abs() < 1e-5);
    }

    #[test]
    fn view_follows_position() {
        let mut camera = Camera2::new(Vec2::new(100.0, 100.0));
        camera.set_position(Vec2::new(50.0, 0.0));
        camera.update(0.0);
        let p = project(&camera, Vec2::new(50.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert_eq!(camera.bounds(), Rect::new(0.0, -50.0, 100.0, 100.0));
    }

    struct Nudge(u32);

    impl CameraEffect for Nudge {
        fn update_transform(&mut self, _: f32, tx: &mut CameraTransform2) {
            self.0 -= 1;
            tx.offset = Vec2::new(1.0, 0.0);
        }

        fn is_done(&self) -> bool {
            self.0 == 0
        }
    }

    #[test]
    fn finished_effect_is_dropped_and_offset_reset() {
        let mut camera = Camera2::new(Vec2::new(10.0, 10.0));
        camera.set_effect(Nudge(2));
        camera.update(0.1);
        assert_eq!(camera.transform().offset, Vec2::new(1.0, 0.0));
        camera.update(0.1);
        assert!(!camera.has_effect());
        assert_eq!(camera.transform().offset, Vec2::zero());
    }
}
