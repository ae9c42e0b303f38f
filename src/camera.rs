use glam::Vec2;

/// Top-left corner of the viewport in world coordinates.
///
/// Screen position = world position - camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Camera {
            position: Vec2::ZERO,
            viewport,
        }
    }

    /// World to screen
    pub fn offset(&self, world: Vec2) -> Vec2 {
        world - self.position
    }

    /// Screen to world
    pub fn to_world(&self, screen: Vec2) -> Vec2 {
        screen + self.position
    }

    /// Centers the viewport on `target`, clamped per axis to `[0, level_size - viewport]`.
    ///
    /// When the level is smaller than the viewport the camera stays at 0.
    pub fn follow(&mut self, target: Vec2, level_size: Vec2) {
        let max = (level_size - self.viewport).max(Vec2::ZERO);
        let desired = target - self.viewport / 2.0;
        self.position = desired.clamp(Vec2::ZERO, max);
    }
}
