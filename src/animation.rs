use crate::assets::Assets;
use crate::error::Result;
use crate::sprite::{RenderTechnique, SpriteView};
use serde::{Deserialize, Serialize};

/// What happens when an animation reaches its last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// 0-1-2-0-1-2...
    #[default]
    Loop,
    /// 0-1-2-1-0-1-2...
    PingPong,
    /// 0-1-2 then hold the last frame
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayDirection {
    Forward,
    Backward,
}

/// Animation description as found in level files and entity parameters
///
/// ```json
/// { "frames": ["sea_1", "sea_2"], "durations": [0.5, 0.5], "mode": "loop" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationData {
    /// Surface keys, one per frame
    pub frames: Vec<String>,
    /// Seconds each frame stays on screen
    pub durations: Vec<f32>,
    #[serde(default)]
    pub mode: AnimationMode,
}

impl AnimationData {
    /// Resolves the frame keys and builds an animated sprite.
    ///
    /// Fails on a missing surface key or on malformed frame/duration data.
    pub fn build(&self, assets: &Assets, technique: RenderTechnique) -> Result<SpriteView> {
        let surfaces = self
            .frames
            .iter()
            .map(|key| assets.surface(key).cloned())
            .collect::<Result<Vec<_>>>()?;

        SpriteView::animated(surfaces, self.durations.clone(), technique, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::render::Surface;

    fn sea_assets() -> Assets {
        let mut assets = Assets::new();
        assets.insert_surface(Surface::new("sea_1", 400, 75));
        assets.insert_surface(Surface::new("sea_2", 400, 75));
        assets
    }

    #[test]
    fn test_animation_data_from_json() {
        let data: AnimationData =
            serde_json::from_str(r#"{"frames": ["sea_1", "sea_2"], "durations": [0.5, 0.5]}"#)
                .unwrap();

        assert_eq!(data.mode, AnimationMode::Loop);
        let sprite = data.build(&sea_assets(), RenderTechnique::Static).unwrap();
        assert_eq!(sprite.frame_count(), 2);
    }

    #[test]
    fn test_animation_data_missing_frame_fails() {
        let data = AnimationData {
            frames: vec!["sea_1".to_string(), "sea_9".to_string()],
            durations: vec![0.5, 0.5],
            mode: AnimationMode::Once,
        };

        let err = data.build(&sea_assets(), RenderTechnique::Static).unwrap_err();
        assert!(matches!(err, GameError::MissingAsset { .. }));
    }
}
