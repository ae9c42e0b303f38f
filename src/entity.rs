//! Entity: one transform plus one sprite, with an optional movement controller
//!
//! Update order is controller, transform, sprite: the controller queues forces from the
//! frame's intent, the transform integrates (kinematic) or waits for the physics step, and the
//! sprite reads the resulting heading (e.g. to flip).

use crate::movement::MovementController;
use crate::render::RenderTarget;
use crate::sprite::SpriteView;
use crate::transform::Transform;
use glam::Vec2;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an entity, unique for the whole process. 0 is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(EntityId(raw))
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    /// Grouping label used by triggers (`remove_entities`) and lookups
    pub tag: String,
    pub transform: Transform,
    pub sprite: SpriteView,
    pub controller: Option<MovementController>,
}

impl Entity {
    pub fn new(tag: impl Into<String>, transform: Transform, sprite: SpriteView) -> Self {
        Entity {
            id: EntityId::next(),
            tag: tag.into(),
            transform,
            sprite,
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: MovementController) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position()
    }

    pub fn angle(&self) -> f32 {
        self.transform.angle()
    }

    pub fn is_dead(&self) -> bool {
        self.controller.as_ref().is_some_and(MovementController::is_dead)
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(controller) = &mut self.controller {
            controller.update(dt, &mut self.transform);
        }
        self.transform.update(dt);
        self.sprite.update(dt, self.transform.angle());
    }

    /// Draws the entity; `camera_offset` is the camera's world position
    pub fn render(&self, camera_offset: Vec2, target: &mut dyn RenderTarget) {
        self.sprite.render(
            self.transform.position() - camera_offset,
            self.transform.angle(),
            target,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCall, RecordingTarget, Surface};
    use crate::sprite::RenderTechnique;
    use crate::transform::KinematicTransform;

    fn drifter(position: Vec2, velocity: Vec2) -> Entity {
        Entity::new(
            "drifter",
            Transform::Kinematic(KinematicTransform::new(position, 0.0).with_velocity(velocity)),
            SpriteView::still(Surface::new("jelly", 8, 8), RenderTechnique::Static).unwrap(),
        )
    }

    #[test]
    fn test_ids_are_unique() {
        let a = drifter(Vec2::ZERO, Vec2::ZERO);
        let b = a.clone();
        let c = drifter(Vec2::ZERO, Vec2::ZERO);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(EntityId::from_raw(0), None);
    }

    #[test]
    fn test_update_moves_then_sprite_sees_heading() {
        let mut entity = Entity::new(
            "sub",
            Transform::Kinematic(
                KinematicTransform::new(Vec2::ZERO, 0.0).with_angular_velocity(std::f32::consts::PI),
            ),
            SpriteView::still(Surface::new("sub", 8, 8), RenderTechnique::Rotated)
                .unwrap()
                .with_heading_flip(),
        );

        entity.update(1.0);
        assert!(entity.sprite.flip_vertical);
    }

    #[test]
    fn test_render_applies_camera_offset() {
        let mut entity = drifter(Vec2::new(120.0, 80.0), Vec2::new(10.0, 0.0));
        entity.update(1.0);

        let mut target = RecordingTarget::new(100.0, 100.0);
        entity.render(Vec2::new(100.0, 50.0), &mut target);

        match &target.calls[..] {
            [DrawCall::Blit { center, .. }] => assert_eq!(*center, Vec2::new(30.0, 30.0)),
            other => panic!("unexpected draw calls: {:?}", other),
        }
    }
}
