//! Play-area geometry: bounds, clamping and proximity checks

use serde::Serialize;

/// Playable width and height, as reported by the render boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl ScreenSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Column enemies spawn on
    pub fn spawn_column(&self) -> f32 {
        self.width - 3.0
    }
}

/// Physics helpers for the arena
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Clamp a player position into `1 <= x <= width - 3`, `1 <= y <= height - 2`
    ///
    /// The upper bound wins when the area is too small to satisfy both.
    pub fn clamp_to_play_area(x: f32, y: f32, area: ScreenSize) -> (f32, f32) {
        let x = x.max(1.0).min(area.width - 3.0);
        let y = y.max(1.0).min(area.height - 2.0);
        (x, y)
    }

    /// True once a disposable entity has left the play area
    ///
    /// A non-finite position is never inside it.
    pub fn is_out_of_bounds(x: f32, y: f32, area: ScreenSize) -> bool {
        !x.is_finite() || !y.is_finite() || x >= area.width - 1.0 || x <= 0.0 || y >= area.height || y <= 0.0
    }

    pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// Strictly closer than `radius`
    pub fn check_collision(a: (f32, f32), b: (f32, f32), radius: f32) -> bool {
        Self::distance(a, b) < radius
    }
}
