use egui::emath::Rot2;
use egui::{Pos2, Vec2};

/// 2D camera over the drawing: the world rectangle of `size` around
/// `center`, turned by `rotation` degrees, is stretched over the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    center: Pos2,
    size: Vec2,
    rotation: f32,
}

impl View {
    /// The view that maps window pixels one-to-one onto world units.
    pub fn for_window(window: Vec2) -> Self {
        Self {
            center: (window / 2.0).to_pos2(),
            size: window,
            rotation: 0.0,
        }
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Scales the visible world area; factors above one show more of it.
    pub fn zoom(&mut self, factor: f32) {
        self.size *= factor;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn pixel_to_world(&self, pixel: Pos2, window: Vec2) -> Pos2 {
        let window = window.max(Vec2::splat(1.0));
        let local = Vec2::new(
            (pixel.x / window.x - 0.5) * self.size.x,
            (pixel.y / window.y - 0.5) * self.size.y,
        );
        self.center + self.rotor() * local
    }

    pub fn world_to_pixel(&self, world: Pos2, window: Vec2) -> Pos2 {
        let local = self.rotor().inverse() * (world - self.center);
        Pos2::new(
            (local.x / self.size.x + 0.5) * window.x,
            (local.y / self.size.y + 0.5) * window.y,
        )
    }

    fn rotor(&self) -> Rot2 {
        Rot2::from_angle(self.rotation.to_radians())
    }
}
