use crate::config::GameConfig;
use crate::assets::Assets;
use crate::entity::Entity;
use crate::error::Result;
use crate::movement::MovementController;
use crate::sprite::{RenderTechnique, SpriteView};
use crate::transform::{BodyDef, PhysicsTransform, ShapeDef, Transform};
use glam::Vec2;

/// Tag carried by the player entity
pub const PLAYER_TAG: &str = "player";

/// Builds the player vessel: a physics-backed hull, a rotated sprite that flips when
/// heading left, and the movement controller.
///
/// `angle` is in radians.
pub fn spawn_player(config: &GameConfig, assets: &Assets, position: Vec2, angle: f32) -> Result<Entity> {
    let player = &config.player;

    let sprite = SpriteView::still(assets.surface(&player.surface)?.clone(), RenderTechnique::Rotated)?
        .with_heading_flip();
    let body = BodyDef {
        shape: ShapeDef::Cuboid {
            half_extents: Vec2::from(player.half_extents),
        },
        density: player.density,
        linear_damping: player.linear_damping,
        angular_damping: player.angular_damping,
        fixed: false,
    };
    let controller = MovementController::new(&config.movement, player.max_life)?;

    Ok(Entity::new(
        PLAYER_TAG,
        Transform::Physics(PhysicsTransform::new(body, position, angle)),
        sprite,
    )
    .with_controller(controller))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::render::Surface;

    #[test]
    fn test_spawn_player() {
        let mut assets = Assets::new();
        assets.insert_surface(Surface::new("player", 24, 10));

        let player = spawn_player(&GameConfig::default(), &assets, Vec2::new(850.0, 20.0), 0.0).unwrap();

        assert_eq!(player.tag, PLAYER_TAG);
        assert_eq!(player.position(), Vec2::new(850.0, 20.0));
        assert!(player.transform.as_physics().is_some());
        assert!(player.sprite.flip_with_heading);
        assert_eq!(player.controller.as_ref().unwrap().profile(), "exploration");
    }

    #[test]
    fn test_spawn_player_needs_its_surface() {
        let err = spawn_player(&GameConfig::default(), &Assets::new(), Vec2::ZERO, 0.0).unwrap_err();
        assert!(matches!(err, GameError::MissingAsset { .. }));
    }
}
