/// Axis-aligned rectangles for trigger zones, clip tests and culling
///
/// Rigid-body collision lives in the physics world (see `physics.rs`). This module only
/// covers the cheap rectangle checks the core needs every frame:
///
/// - `Rect::contains_point`: trigger zones against the tracked player position
/// - `aabb_intersect`: sprite bounds against the render target's clip rect
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in world or screen space.
///
/// The left/top edges are inclusive and the right/bottom edges are exclusive, so two
/// rectangles that only touch do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Rect::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Checks whether a point lies inside the rectangle (left/top inclusive).
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

impl From<[f32; 4]> for Rect {
    fn from(value: [f32; 4]) -> Self {
        Rect::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(rect: Rect) -> Self {
        [rect.x, rect.y, rect.width, rect.height]
    }
}

/// Checks if two axis-aligned bounding boxes intersect.
///
/// Two rectangles intersect if they overlap on both the X and Y axes. Touching edges
/// do not count as an overlap.
pub fn aabb_intersect(a: &Rect, b: &Rect) -> bool {
    let x_overlap = a.x < b.right() && a.right() > b.x;
    let y_overlap = a.y < b.bottom() && a.bottom() > b.y;

    x_overlap && y_overlap
}
