//! Abyssal: simulation and rendering core of a 2D top-down submarine action game
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - `transform` / `sprite` / `entity`: motion state, visuals, and the pair of both
//! - `camera`: world to viewport conversion
//! - `scene`: tile terrain (`TileScene`) and entities plus physics (`DynamicScene`)
//! - `visibility`: per-frame raycast lighting cone against the collision grid
//! - `movement`: intent-driven steering, thrust profiles, impact damage
//! - `game`: triggers, entity factory, level transitions and the `WorldController`
//! - `instance`: stack of independently clocked runnables (screens/modes)
//!
//! Rendering and audio go through the `RenderTarget` and `AudioSink` traits. The SDL2
//! backend lives behind the `sdl` feature.

pub mod animation;
pub mod assets;
pub mod audio;
pub mod camera;
pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod health;
pub mod input_system;
pub mod instance;
pub mod movement;
pub mod physics;
pub mod player;
pub mod render;
pub mod scene;
pub mod sprite;
pub mod tile;
pub mod transform;
pub mod visibility;

#[cfg(feature = "sdl")]
pub mod sdl_backend;

pub use error::{GameError, Result};
