//! Read-mostly asset tables
//!
//! An external loader fills the tables once at startup; the core only reads them by key.
//! Every lookup of an unknown key is a `MissingAsset` error: nothing is synthesised.

use crate::error::{GameError, Result};
use crate::game::level::LevelDescriptor;
use crate::render::Surface;
use crate::tile::{TileAtlas, TileGrid};
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Assets {
    surfaces: HashMap<String, Surface>,
    atlases: HashMap<String, TileAtlas>,
    tilemaps: HashMap<String, TileGrid>,
    levels: HashMap<String, LevelDescriptor>,
    sounds: HashSet<String>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_surface(&mut self, surface: Surface) {
        self.surfaces.insert(surface.key.clone(), surface);
    }

    pub fn insert_atlas(&mut self, key: impl Into<String>, atlas: TileAtlas) {
        self.atlases.insert(key.into(), atlas);
    }

    pub fn insert_tilemap(&mut self, key: impl Into<String>, grid: TileGrid) {
        self.tilemaps.insert(key.into(), grid);
    }

    pub fn insert_level(&mut self, key: impl Into<String>, level: LevelDescriptor) {
        self.levels.insert(key.into(), level);
    }

    /// Reads a level descriptor from a JSON file and stores it under `key`
    pub fn load_level_file(&mut self, key: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let level: LevelDescriptor = serde_json::from_str(&content)?;
        self.insert_level(key, level);
        Ok(())
    }

    pub fn insert_sound(&mut self, key: impl Into<String>) {
        self.sounds.insert(key.into());
    }

    pub fn surface(&self, key: &str) -> Result<&Surface> {
        self.surfaces.get(key).ok_or_else(|| missing("surface", key))
    }

    pub fn atlas(&self, key: &str) -> Result<&TileAtlas> {
        self.atlases.get(key).ok_or_else(|| missing("tileset", key))
    }

    pub fn tilemap(&self, key: &str) -> Result<&TileGrid> {
        self.tilemaps.get(key).ok_or_else(|| missing("tilemap", key))
    }

    pub fn level(&self, key: &str) -> Result<&LevelDescriptor> {
        self.levels.get(key).ok_or_else(|| missing("level", key))
    }

    pub fn has_level(&self, key: &str) -> bool {
        self.levels.contains_key(key)
    }

    pub fn require_sound(&self, key: &str) -> Result<()> {
        if self.sounds.contains(key) {
            Ok(())
        } else {
            Err(missing("sound", key))
        }
    }
}

fn missing(table: &'static str, key: &str) -> GameError {
    GameError::MissingAsset {
        table,
        key: key.to_string(),
    }
}
