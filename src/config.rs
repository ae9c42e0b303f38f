//! Game configuration loaded from JSON
//!
//! Every section has defaults, so a config file only needs the values it overrides:
//!
//! ```json
//! { "viewport": { "width": 640, "height": 480 }, "cone": { "rays": 80 } }
//! ```

use crate::error::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub viewport: ViewportConfig,
    pub player: PlayerConfig,
    pub movement: MovementConfig,
    pub cone: ConeConfig,
    pub overlay: OverlayConfig,
    pub transition: TransitionConfig,
    pub audio: AudioConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses and validates a config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(GameError::InvalidConfig(
                "viewport must have a non-zero size".to_string(),
            ));
        }
        if self.viewport.fps == 0 {
            return Err(GameError::InvalidConfig("fps must be at least 1".to_string()));
        }
        if !(self.cone.radius > 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "cone radius must be positive, got {}",
                self.cone.radius
            )));
        }
        if !self.movement.profiles.contains_key(&self.movement.default_profile) {
            return Err(GameError::UnknownProfile(
                self.movement.default_profile.clone(),
            ));
        }
        self.movement.impacts.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            width: 400,
            height: 300,
            fps: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Surface key of the vessel sprite
    pub surface: String,
    /// Half width and half height of the hull collider
    pub half_extents: [f32; 2],
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub max_life: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            surface: "player".to_string(),
            half_extents: [12.0, 5.0],
            density: 1.0,
            linear_damping: 2.0,
            angular_damping: 1.0,
            max_life: 100.0,
        }
    }
}

/// Force magnitude applied per held direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrustProfile {
    pub thrust: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub profiles: HashMap<String, ThrustProfile>,
    pub default_profile: String,
    pub boost_multiplier: f32,
    /// Torque per radian of heading error
    pub steering_gain: f32,
    /// Fraction of angular velocity kept after one second
    pub angular_decay: f32,
    pub impacts: ImpactTiers,
}

impl Default for MovementConfig {
    fn default() -> Self {
        let profiles = HashMap::from([
            ("exploration".to_string(), ThrustProfile { thrust: 60_000.0 }),
            ("chase".to_string(), ThrustProfile { thrust: 120_000.0 }),
        ]);

        MovementConfig {
            profiles,
            default_profile: "exploration".to_string(),
            boost_multiplier: 1.8,
            steering_gain: 200_000.0,
            angular_decay: 0.05,
            impacts: ImpactTiers::default(),
        }
    }
}

/// One severity tier: impacts with at least `min_energy` deduct `damage` life
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactTier {
    pub min_energy: f32,
    pub damage: f32,
}

/// Light/medium/heavy impact classification.
///
/// Tiers are half-open: light covers `[light.min_energy, medium.min_energy)`, medium covers
/// `[medium.min_energy, heavy.min_energy)`, heavy everything above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactTiers {
    pub light: ImpactTier,
    pub medium: ImpactTier,
    pub heavy: ImpactTier,
}

impl Default for ImpactTiers {
    fn default() -> Self {
        ImpactTiers {
            light: ImpactTier {
                min_energy: 200_000.0,
                damage: 5.0,
            },
            medium: ImpactTier {
                min_energy: 1_000_000.0,
                damage: 15.0,
            },
            heavy: ImpactTier {
                min_energy: 3_000_000.0,
                damage: 40.0,
            },
        }
    }
}

impl ImpactTiers {
    pub fn validate(&self) -> Result<()> {
        let ascending = self.light.min_energy >= 0.0
            && self.light.min_energy < self.medium.min_energy
            && self.medium.min_energy < self.heavy.min_energy;

        if ascending {
            Ok(())
        } else {
            Err(GameError::InvalidConfig(
                "impact tiers must have strictly ascending energies".to_string(),
            ))
        }
    }

    /// Life lost for an impact of the given kinetic energy, if any
    pub fn damage_for(&self, energy: f32) -> Option<f32> {
        if energy >= self.heavy.min_energy {
            Some(self.heavy.damage)
        } else if energy >= self.medium.min_energy {
            Some(self.medium.damage)
        } else if energy >= self.light.min_energy {
            Some(self.light.damage)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeConfig {
    /// Full opening angle in degrees
    pub aperture_deg: f32,
    pub rays: usize,
    pub radius: f32,
}

impl Default for ConeConfig {
    fn default() -> Self {
        ConeConfig {
            aperture_deg: 80.0,
            rays: 50,
            radius: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Shadow surface multiplied over darkened levels
    pub surface: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            surface: "shadow".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub surface: String,
    /// Slide speed in pixels per second
    pub speed: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            surface: "frame".to_string(),
            speed: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Multiplier applied to every track volume
    pub music_volume: f32,
    pub fade_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            music_volume: 1.0,
            fade_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.viewport.width, 400);
        assert_eq!(config.cone.rays, 50);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GameConfig::from_json(r#"{"viewport": {"width": 640}, "cone": {"rays": 80}}"#).unwrap();

        assert_eq!(config.viewport.width, 640);
        assert_eq!(config.viewport.height, 300);
        assert_eq!(config.cone.rays, 80);
        assert_eq!(config.movement.default_profile, "exploration");
    }

    #[test]
    fn test_unknown_default_profile_rejected() {
        let err = GameConfig::from_json(r#"{"movement": {"default_profile": "warp"}}"#).unwrap_err();
        assert!(matches!(err, GameError::UnknownProfile(p) if p == "warp"));
    }

    #[test]
    fn test_non_ascending_tiers_rejected() {
        let mut config = GameConfig::default();
        config.movement.impacts.medium.min_energy = 5_000_000.0;

        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_impact_tiers_half_open() {
        let tiers = ImpactTiers::default();

        assert_eq!(tiers.damage_for(199_999.0), None);
        assert_eq!(tiers.damage_for(200_000.0), Some(5.0));
        assert_eq!(tiers.damage_for(999_999.0), Some(5.0));
        assert_eq!(tiers.damage_for(1_000_000.0), Some(15.0));
        assert_eq!(tiers.damage_for(2_999_999.0), Some(15.0));
        assert_eq!(tiers.damage_for(3_000_000.0), Some(40.0));
        assert_eq!(tiers.damage_for(1e9), Some(40.0));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GameConfig::load_from_file("/nonexistent/abyssal.json").unwrap_err();
        assert!(matches!(err, GameError::Io(_)));
    }
}
