//! Intent-driven movement for a physics-backed vessel
//!
//! # Architecture
//!
//! Input handling never touches the transform directly. It fills a `MovementIntent`, which
//! the controller consumes (and resets) on its next update:
//!
//! 1. Steering: torque proportional to the signed error between the current heading and the
//!    direction of the aim point, then angular velocity decayed by `decay^dt`
//! 2. Thrust: one force along the held direction, scaled by how well it lines up with the
//!    heading (`1 + cos²` forward, nothing backward), by the active profile and by boost
//! 3. Impacts: the first contact with something classifies the kinetic energy into a severity
//!    tier and deducts life once; the same contact never hurts again until it ends

use crate::config::{ImpactTiers, MovementConfig, ThrustProfile};
use crate::error::{GameError, Result};
use crate::health::{DamageResult, Health};
use crate::physics::ContactKey;
use crate::transform::Transform;
use glam::Vec2;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Directional input gathered over one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
    /// Point to face, in world coordinates
    pub aim: Option<Vec2>,
}

impl MovementIntent {
    /// Unit vector of the held directions, zero when nothing (or opposing keys) is held
    pub fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.up {
            direction.y -= 1.0;
        }
        if self.down {
            direction.y += 1.0;
        }
        if self.left {
            direction.x -= 1.0;
        }
        if self.right {
            direction.x += 1.0;
        }
        direction.normalize_or_zero()
    }
}

/// Wraps an angle into `[-PI, PI]`
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped < -PI { wrapped + TAU } else { wrapped }
}

/// Thrust scale for moving at `angle_diff` radians off the heading
pub fn thrust_multiplier(angle_diff: f32) -> f32 {
    let diff = wrap_angle(angle_diff);
    if diff.abs() < FRAC_PI_2 {
        1.0 + diff.cos().powi(2)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct MovementController {
    intent: MovementIntent,
    profiles: HashMap<String, ThrustProfile>,
    profile: String,
    boost_multiplier: f32,
    steering_gain: f32,
    angular_decay: f32,
    impacts: ImpactTiers,
    health: Health,
    active_contacts: HashSet<ContactKey>,
    dead: bool,
}

impl MovementController {
    pub fn new(config: &MovementConfig, max_life: f32) -> Result<Self> {
        if !config.profiles.contains_key(&config.default_profile) {
            return Err(GameError::UnknownProfile(config.default_profile.clone()));
        }
        config.impacts.validate()?;

        Ok(MovementController {
            intent: MovementIntent::default(),
            profiles: config.profiles.clone(),
            profile: config.default_profile.clone(),
            boost_multiplier: config.boost_multiplier,
            steering_gain: config.steering_gain,
            angular_decay: config.angular_decay,
            impacts: config.impacts,
            health: Health::new(max_life),
            active_contacts: HashSet::new(),
            dead: false,
        })
    }

    /// Replaces this frame's intent; it is consumed by the next `update`
    pub fn set_intent(&mut self, intent: MovementIntent) {
        self.intent = intent;
    }

    pub fn intent(&self) -> &MovementIntent {
        &self.intent
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn set_profile(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(GameError::UnknownProfile(name.to_string()));
        }
        debug!("Movement profile: {} -> {}", self.profile, name);
        self.profile = name.to_string();
        Ok(())
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Consumes the intent and queues steering and thrust on `transform`
    pub fn update(&mut self, dt: f32, transform: &mut Transform) {
        let intent = std::mem::take(&mut self.intent);
        if self.dead {
            return;
        }

        let angle = transform.angle();
        let to_aim = intent.aim.map(|aim| aim - transform.position());
        if let Some(to_aim) = to_aim.filter(|v| v.length_squared() > f32::EPSILON) {
            let error = wrap_angle(to_aim.y.atan2(to_aim.x) - angle);
            transform.apply_torque(self.steering_gain * error);
        }
        transform.scale_angular_velocity(self.angular_decay.powf(dt));

        let direction = intent.direction();
        if direction == Vec2::ZERO {
            return;
        }

        let thrust = self.profiles.get(&self.profile).map_or(0.0, |p| p.thrust);
        let boost = if intent.boost { self.boost_multiplier } else { 1.0 };
        let multiplier = thrust_multiplier(direction.y.atan2(direction.x) - angle);
        transform.apply_force(direction * thrust * boost * multiplier);
    }

    /// Handles the start of a contact carrying `energy` joules of kinetic energy.
    ///
    /// Returns the damage taken, or `None` if the contact was already active or too soft.
    pub fn on_contact_started(&mut self, key: ContactKey, energy: f32) -> Option<DamageResult> {
        if !self.active_contacts.insert(key) {
            return None;
        }
        let damage = self.impacts.damage_for(energy)?;

        let result = self.health.take_damage(damage);
        debug!(
            "Impact: energy {:.0}, {} damage, life {}",
            energy,
            result.damage_dealt,
            self.health.current()
        );
        if result.is_fatal {
            self.dead = true;
        }
        Some(result)
    }

    pub fn on_contact_stopped(&mut self, key: ContactKey) {
        self.active_contacts.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementConfig;
    use crate::transform::KinematicTransform;
    use approx::assert_relative_eq;

    fn controller() -> MovementController {
        MovementController::new(&MovementConfig::default(), 100.0).unwrap()
    }

    fn facing_right() -> Transform {
        Transform::Kinematic(KinematicTransform::new(Vec2::new(100.0, 100.0), 0.0))
    }

    #[test]
    fn test_thrust_multiplier() {
        assert_relative_eq!(thrust_multiplier(0.0), 2.0);
        assert_relative_eq!(thrust_multiplier(PI / 3.0), 1.25, epsilon = 1e-5);
        assert_relative_eq!(thrust_multiplier(-PI / 3.0), 1.25, epsilon = 1e-5);
        assert_eq!(thrust_multiplier(FRAC_PI_2), 0.0);
        assert_eq!(thrust_multiplier(PI), 0.0);
        assert_relative_eq!(thrust_multiplier(TAU), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(-3.0 * PI / 2.0), FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(wrap_angle(0.25), 0.25);
    }

    #[test]
    fn test_forward_thrust_doubled_backward_cut() {
        let mut movement = controller();

        let mut forward = facing_right();
        movement.set_intent(MovementIntent {
            right: true,
            ..Default::default()
        });
        movement.update(1.0, &mut forward);
        forward.update(1.0);
        assert_relative_eq!(forward.velocity().x, 120_000.0);

        let mut backward = facing_right();
        movement.set_intent(MovementIntent {
            left: true,
            ..Default::default()
        });
        movement.update(1.0, &mut backward);
        backward.update(1.0);
        assert_eq!(backward.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_intent_consumed_after_update() {
        let mut movement = controller();
        let mut transform = facing_right();

        movement.set_intent(MovementIntent {
            right: true,
            ..Default::default()
        });
        movement.update(0.1, &mut transform);

        assert_eq!(*movement.intent(), MovementIntent::default());
    }

    #[test]
    fn test_boost_and_profile_swap() {
        let mut movement = controller();
        movement.set_profile("chase").unwrap();

        let mut transform = facing_right();
        movement.set_intent(MovementIntent {
            right: true,
            boost: true,
            ..Default::default()
        });
        movement.update(1.0, &mut transform);
        transform.update(1.0);

        assert_relative_eq!(transform.velocity().x, 120_000.0 * 2.0 * 1.8, max_relative = 1e-5);
        assert!(matches!(
            movement.set_profile("warp"),
            Err(GameError::UnknownProfile(_))
        ));
        assert_eq!(movement.profile(), "chase");
    }

    #[test]
    fn test_steering_turns_toward_aim() {
        let mut movement = controller();
        let mut transform = facing_right();

        movement.set_intent(MovementIntent {
            aim: Some(Vec2::new(100.0, 200.0)),
            ..Default::default()
        });
        movement.update(0.01, &mut transform);
        transform.update(0.01);

        assert!(transform.angular_velocity() > 0.0);
    }

    #[test]
    fn test_zero_length_aim_leaves_rotation_alone() {
        let mut movement = controller();
        let mut transform = facing_right();

        movement.set_intent(MovementIntent {
            aim: Some(Vec2::new(100.0, 100.0)),
            ..Default::default()
        });
        movement.update(0.016, &mut transform);
        transform.update(0.016);

        assert_eq!(transform.angle(), 0.0);
        assert_eq!(transform.angular_velocity(), 0.0);
        assert!(transform.angle().is_finite());
    }

    #[test]
    fn test_impact_damage_once_per_contact() {
        let mut movement = controller();
        let key = ContactKey::for_test(1);

        let hit = movement.on_contact_started(key, 1_500_000.0).unwrap();
        assert_eq!(hit.damage_dealt, 15.0);
        assert!(movement.on_contact_started(key, 1_500_000.0).is_none());
        assert_eq!(movement.health().current(), 85.0);

        movement.on_contact_stopped(key);
        movement.on_contact_started(key, 250_000.0);
        assert_eq!(movement.health().current(), 80.0);
    }

    #[test]
    fn test_soft_contact_no_damage() {
        let mut movement = controller();
        assert!(movement.on_contact_started(ContactKey::for_test(2), 10.0).is_none());
        assert_eq!(movement.health().current(), 100.0);
    }

    #[test]
    fn test_fatal_impact_sets_dead() {
        let mut movement = MovementController::new(&MovementConfig::default(), 30.0).unwrap();

        movement.on_contact_started(ContactKey::for_test(1), 5_000_000.0);
        assert!(movement.is_dead());

        let mut transform = facing_right();
        movement.set_intent(MovementIntent {
            right: true,
            ..Default::default()
        });
        movement.update(1.0, &mut transform);
        transform.update(1.0);
        assert_eq!(transform.velocity(), Vec2::ZERO);
    }
}
