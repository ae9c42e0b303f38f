use crate::game::factory::EntityDescriptor;
use crate::game::trigger::TriggerDescriptor;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Everything needed to build one level, as authored in JSON:
///
/// ```json
/// {
///   "tilemap": "cave", "tileset": "rocks", "tile_pitch": 16,
///   "spawn": [850, 20], "spawn_angle": 90,
///   "entities": [{ "type": "static_sprite", "surface": "kelp", "position": [40, 60] }],
///   "triggers": [{ "rect": [0, 0, 50, 50], "action": "switch_zone",
///                  "level": "B", "spawn": [10, 10] }],
///   "overlay": { "enabled": true, "brightness": -120 },
///   "music": { "track": "depths", "volume": 0.6 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Tile map asset key
    pub tilemap: String,
    /// Tile atlas asset key
    pub tileset: String,
    #[serde(default = "default_pitch")]
    pub tile_pitch: u32,
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
    #[serde(default)]
    pub triggers: Vec<TriggerDescriptor>,
    /// Default player position when no spawn was carried over
    pub spawn: Vec2,
    /// Degrees
    #[serde(default)]
    pub spawn_angle: f32,
    #[serde(default)]
    pub overlay: OverlayDescriptor,
    #[serde(default)]
    pub music: Option<MusicDescriptor>,
}

fn default_pitch() -> u32 {
    16
}

/// Darkness filter drawn over the level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayDescriptor {
    pub enabled: bool,
    /// Brightness shift in [-255, 255]; 255 disables the filter
    pub brightness: i16,
}

impl Default for OverlayDescriptor {
    fn default() -> Self {
        OverlayDescriptor {
            enabled: false,
            brightness: 255,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicDescriptor {
    pub track: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}
