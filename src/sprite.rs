use crate::animation::{AnimationMode, PlayDirection};
use crate::collision::{aabb_intersect, Rect};
use crate::error::{GameError, Result};
use crate::render::{Blend, Blit, RenderTarget, Surface};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How a sprite turns its transform's angle into pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTechnique {
    /// Drawn unrotated
    #[default]
    Static,
    /// Rotated by the target every frame
    Rotated,
    /// Nearest precomputed rotation variant of a cached surface
    Cached,
}

/// Visual half of an entity: one or more frames plus the technique used to draw them.
///
/// A still sprite is an animation with a single frame that never advances.
#[derive(Debug, Clone)]
pub struct SpriteView {
    frames: Vec<Surface>,
    durations: Vec<f32>,
    mode: AnimationMode,
    current_frame: usize,
    elapsed: f32,
    play_direction: PlayDirection,
    is_playing: bool,
    technique: RenderTechnique,
    pub flip_vertical: bool,
    /// Flip vertically whenever the heading points into the left half plane
    pub flip_with_heading: bool,
    pub blend: Blend,
    pub brightness: i16,
}

impl SpriteView {
    /// Single-frame sprite
    pub fn still(surface: Surface, technique: RenderTechnique) -> Result<Self> {
        Self::build(vec![surface], Vec::new(), technique, AnimationMode::Loop)
    }

    /// Animated sprite; every frame stays on screen for its matching duration.
    pub fn animated(
        frames: Vec<Surface>,
        durations: Vec<f32>,
        technique: RenderTechnique,
        mode: AnimationMode,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(GameError::InvalidAnimation(
                "an animation needs at least one frame".to_string(),
            ));
        }
        if frames.len() != durations.len() {
            return Err(GameError::InvalidAnimation(format!(
                "{} frames but {} durations",
                frames.len(),
                durations.len()
            )));
        }
        if let Some(bad) = durations.iter().find(|d| !(**d > 0.0)) {
            return Err(GameError::InvalidAnimation(format!(
                "frame duration must be greater than 0, got {}",
                bad
            )));
        }

        Self::build(frames, durations, technique, mode)
    }

    fn build(
        frames: Vec<Surface>,
        durations: Vec<f32>,
        technique: RenderTechnique,
        mode: AnimationMode,
    ) -> Result<Self> {
        if technique == RenderTechnique::Cached {
            if let Some(uncached) = frames.iter().find(|f| !f.is_cached()) {
                return Err(GameError::UncachedSurface(uncached.key.clone()));
            }
        }

        Ok(SpriteView {
            frames,
            durations,
            mode,
            current_frame: 0,
            elapsed: 0.0,
            play_direction: PlayDirection::Forward,
            is_playing: true,
            technique,
            flip_vertical: false,
            flip_with_heading: false,
            blend: Blend::Normal,
            brightness: 0,
        })
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_heading_flip(mut self) -> Self {
        self.flip_with_heading = true;
        self
    }

    pub fn technique(&self) -> RenderTechnique {
        self.technique
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_surface(&self) -> &Surface {
        &self.frames[self.current_frame]
    }

    pub fn is_finished(&self) -> bool {
        self.mode == AnimationMode::Once && !self.is_playing
    }

    /// Advances the animation by `delta` seconds. `heading` is the owning transform's
    /// angle in radians, already updated this frame.
    pub fn update(&mut self, delta: f32, heading: f32) {
        if self.flip_with_heading {
            self.flip_vertical = heading.cos() < 0.0;
        }

        if !self.is_playing || self.durations.is_empty() {
            return;
        }

        self.elapsed += delta;
        while self.is_playing && self.elapsed >= self.durations[self.current_frame] {
            self.elapsed -= self.durations[self.current_frame];
            self.advance_frame();
        }
    }

    fn advance_frame(&mut self) {
        let last = self.frames.len() - 1;

        match self.mode {
            AnimationMode::Loop => {
                self.current_frame = if self.current_frame < last {
                    self.current_frame + 1
                } else {
                    0
                };
            }
            AnimationMode::PingPong => match self.play_direction {
                PlayDirection::Forward => {
                    if self.current_frame < last {
                        self.current_frame += 1;
                    } else {
                        self.play_direction = PlayDirection::Backward;
                        self.current_frame = self.current_frame.saturating_sub(1);
                    }
                }
                PlayDirection::Backward => {
                    if self.current_frame > 0 {
                        self.current_frame -= 1;
                    } else {
                        self.play_direction = PlayDirection::Forward;
                        self.current_frame = last.min(1);
                    }
                }
            },
            AnimationMode::Once => {
                if self.current_frame < last {
                    self.current_frame += 1;
                } else {
                    self.is_playing = false;
                    self.elapsed = 0.0;
                }
            }
        }
    }

    /// Draws the current frame centered on `offset` (screen space). `angle` is in radians.
    pub fn render(&self, offset: Vec2, angle: f32, target: &mut dyn RenderTarget) {
        let surface = self.current_surface();
        let degrees = angle.to_degrees();

        let mut blit = Blit::new(surface, offset);
        blit.flip_vertical = self.flip_vertical;
        blit.blend = self.blend;
        blit.brightness = self.brightness;

        let bounds = match self.technique {
            RenderTechnique::Static => blit.bounds(),
            RenderTechnique::Rotated => {
                blit.angle = degrees;
                rotated_bounds(offset, surface.size())
            }
            RenderTechnique::Cached => {
                blit.variant = surface.variant_for(degrees);
                rotated_bounds(offset, surface.size())
            }
        };

        if aabb_intersect(&bounds, &target.clip()) {
            target.blit(&blit);
        }
    }
}

/// Square that contains the image at any rotation
fn rotated_bounds(center: Vec2, size: Vec2) -> Rect {
    let diagonal = size.length();
    Rect::from_center(center, Vec2::splat(diagonal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCall, RecordingTarget};

    fn frames(count: usize) -> Vec<Surface> {
        (0..count)
            .map(|i| Surface::new(format!("frame_{}", i), 16, 16))
            .collect()
    }

    #[test]
    fn test_animation_frame_after_half_second() {
        let mut sprite = SpriteView::animated(
            frames(3),
            vec![0.2, 0.2, 0.2],
            RenderTechnique::Static,
            AnimationMode::Loop,
        )
        .unwrap();

        for _ in 0..5 {
            sprite.update(0.1, 0.0);
        }

        assert_eq!(sprite.current_frame(), 2);
    }

    #[test]
    fn test_animation_large_step_skips_frames() {
        let mut sprite = SpriteView::animated(
            frames(3),
            vec![0.2, 0.2, 0.2],
            RenderTechnique::Static,
            AnimationMode::Loop,
        )
        .unwrap();

        sprite.update(0.5, 0.0);
        assert_eq!(sprite.current_frame(), 2);
    }

    #[test]
    fn test_animation_loops_back() {
        let mut sprite = SpriteView::animated(
            frames(2),
            vec![0.5, 0.5],
            RenderTechnique::Static,
            AnimationMode::Loop,
        )
        .unwrap();

        sprite.update(1.25, 0.0);
        assert_eq!(sprite.current_frame(), 0);
    }

    #[test]
    fn test_animation_once_holds_last_frame() {
        let mut sprite = SpriteView::animated(
            frames(3),
            vec![0.1, 0.1, 0.1],
            RenderTechnique::Static,
            AnimationMode::Once,
        )
        .unwrap();

        sprite.update(5.0, 0.0);
        assert_eq!(sprite.current_frame(), 2);
        assert!(sprite.is_finished());
    }

    #[test]
    fn test_animation_ping_pong() {
        let mut sprite = SpriteView::animated(
            frames(3),
            vec![1.0, 1.0, 1.0],
            RenderTechnique::Static,
            AnimationMode::PingPong,
        )
        .unwrap();

        let mut seen = Vec::new();
        for _ in 0..5 {
            sprite.update(1.0, 0.0);
            seen.push(sprite.current_frame());
        }
        assert_eq!(seen, vec![1, 2, 1, 0, 1]);
    }

    #[test]
    fn test_animation_rejects_bad_data() {
        let empty = SpriteView::animated(
            Vec::new(),
            Vec::new(),
            RenderTechnique::Static,
            AnimationMode::Loop,
        );
        assert!(matches!(empty, Err(GameError::InvalidAnimation(_))));

        let mismatch = SpriteView::animated(
            frames(3),
            vec![0.2, 0.2],
            RenderTechnique::Static,
            AnimationMode::Loop,
        );
        assert!(matches!(mismatch, Err(GameError::InvalidAnimation(_))));

        let zero = SpriteView::animated(
            frames(2),
            vec![0.2, 0.0],
            RenderTechnique::Static,
            AnimationMode::Loop,
        );
        assert!(matches!(zero, Err(GameError::InvalidAnimation(_))));
    }

    #[test]
    fn test_cached_technique_requires_cached_surface() {
        let plain = SpriteView::still(Surface::new("rock", 16, 16), RenderTechnique::Cached);
        assert!(matches!(plain, Err(GameError::UncachedSurface(_))));

        let cached = SpriteView::still(
            Surface::new("rock", 16, 16).with_rotation_cache(8),
            RenderTechnique::Cached,
        );
        assert!(cached.is_ok());
    }

    #[test]
    fn test_render_techniques() {
        let mut target = RecordingTarget::new(100.0, 100.0);
        let center = Vec2::new(50.0, 50.0);
        let angle = std::f32::consts::FRAC_PI_2;

        SpriteView::still(Surface::new("a", 8, 8), RenderTechnique::Static)
            .unwrap()
            .render(center, angle, &mut target);
        SpriteView::still(Surface::new("b", 8, 8), RenderTechnique::Rotated)
            .unwrap()
            .render(center, angle, &mut target);
        SpriteView::still(
            Surface::new("c", 8, 8).with_rotation_cache(4),
            RenderTechnique::Cached,
        )
        .unwrap()
        .render(center, angle, &mut target);

        match &target.calls[..] {
            [DrawCall::Blit { angle: a, variant: None, .. }, DrawCall::Blit { angle: b, variant: None, .. }, DrawCall::Blit { angle: c, variant: Some(1), .. }] =>
            {
                assert_eq!(*a, 0.0);
                assert!((b - 90.0).abs() < 1e-3);
                assert_eq!(*c, 0.0);
            }
            other => panic!("unexpected draw calls: {:?}", other),
        }
    }

    #[test]
    fn test_render_culls_offscreen() {
        let mut target = RecordingTarget::new(100.0, 100.0);
        let sprite = SpriteView::still(Surface::new("a", 8, 8), RenderTechnique::Static).unwrap();

        sprite.render(Vec2::new(-50.0, 50.0), 0.0, &mut target);
        sprite.render(Vec2::new(102.0, 50.0), 0.0, &mut target);

        assert_eq!(target.blit_count(), 1);
    }

    #[test]
    fn test_heading_flip() {
        let mut sprite = SpriteView::still(Surface::new("sub", 24, 12), RenderTechnique::Rotated)
            .unwrap()
            .with_heading_flip();

        sprite.update(0.016, std::f32::consts::PI);
        assert!(sprite.flip_vertical);

        sprite.update(0.016, 0.2);
        assert!(!sprite.flip_vertical);
    }
}
