//! Scenes: renderable, updatable collections sharing one coordinate space
//!
//! # Architecture
//!
//! - `TileScene`: static terrain grid, rendered with viewport culling
//! - `DynamicScene`: ordered entities plus the physics world that owns their bodies
//!
//! A level is drawn as background entities, terrain, then foreground entities. The world
//! controller keeps the scenes in that order and drives them through this trait.
pub mod dynamic_scene;
pub mod tile_scene;

pub use dynamic_scene::DynamicScene;
pub use tile_scene::TileScene;

use crate::camera::Camera;
use crate::render::RenderTarget;

pub trait Scene {
    fn update(&mut self, dt: f32);

    fn render(&self, camera: &Camera, target: &mut dyn RenderTarget);
}
