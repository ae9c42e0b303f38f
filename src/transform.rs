//! Position, velocity and orientation of an entity
//!
//! # Variants
//!
//! - `Kinematic`: integrated explicitly every update. Damping is the fraction of velocity
//!   kept after one second and is raised to the power of `dt`, so the motion does not depend
//!   on the frame rate.
//! - `Physics`: the state is owned by a `PhysicsWorld`. Callers queue forces, torques and
//!   teleports between ticks; the owning scene pushes them into the simulation before the
//!   step and copies the resulting state back afterwards.
//!
//! Angles are in radians, clockwise on screen (y points down).

use crate::physics::WorldId;
use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicTransform {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    /// Fraction of velocity kept after one second, in (0, 1]
    pub damping: f32,
    /// Fraction of angular velocity kept after one second, in (0, 1]
    pub angular_damping: f32,
    pending_force: Vec2,
    pending_torque: f32,
}

impl KinematicTransform {
    pub fn new(position: Vec2, angle: f32) -> Self {
        KinematicTransform {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            angle,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            damping: 1.0,
            angular_damping: 1.0,
            pending_force: Vec2::ZERO,
            pending_torque: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_damping(mut self, damping: f32, angular_damping: f32) -> Self {
        self.damping = damping;
        self.angular_damping = angular_damping;
        self
    }

    pub fn update(&mut self, dt: f32) {
        let acceleration = self.acceleration + self.pending_force;
        let angular_acceleration = self.angular_acceleration + self.pending_torque;
        self.pending_force = Vec2::ZERO;
        self.pending_torque = 0.0;

        self.position += self.velocity * dt;
        self.velocity = (self.velocity + acceleration * dt) * self.damping.powf(dt);
        self.angle += self.angular_velocity * dt;
        self.angular_velocity =
            (self.angular_velocity + angular_acceleration * dt) * self.angular_damping.powf(dt);
    }
}

/// Collider shape of a physics-backed transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDef {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec2 },
}

/// Everything needed to create the rigid body once the transform joins a world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub shape: ShapeDef,
    pub density: f32,
    /// Rapier damping coefficients
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Immovable body
    pub fixed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyState {
    Unregistered,
    Registered { world: WorldId, body: RigidBodyHandle },
}

/// Inputs queued between two physics steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingInput {
    pub force: Vec2,
    pub torque: f32,
    pub angular_scale: f32,
    pub teleport: Option<Vec2>,
}

impl Default for PendingInput {
    fn default() -> Self {
        PendingInput {
            force: Vec2::ZERO,
            torque: 0.0,
            angular_scale: 1.0,
            teleport: None,
        }
    }
}

/// Transform whose state lives in a `PhysicsWorld`; the fields here are a copy refreshed
/// after every step.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsTransform {
    pub(crate) def: BodyDef,
    pub(crate) state: BodyState,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) angle: f32,
    pub(crate) angular_velocity: f32,
    pub(crate) mass: f32,
    pending: PendingInput,
}

impl PhysicsTransform {
    pub fn new(def: BodyDef, position: Vec2, angle: f32) -> Self {
        PhysicsTransform {
            def,
            state: BodyState::Unregistered,
            position,
            velocity: Vec2::ZERO,
            angle,
            angular_velocity: 0.0,
            mass: 0.0,
            pending: PendingInput::default(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Mass computed by the simulation; 0 until registered
    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, BodyState::Registered { .. })
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.pending.force += force;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.pending.torque += torque;
    }

    pub fn scale_angular_velocity(&mut self, factor: f32) {
        self.pending.angular_scale *= factor;
    }

    /// Moves the body on the next step. Before registration this sets the spawn position.
    pub fn set_position(&mut self, position: Vec2) {
        if self.is_registered() {
            self.pending.teleport = Some(position);
        } else {
            self.position = position;
        }
    }

    pub(crate) fn take_pending(&mut self) -> PendingInput {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Kinematic(KinematicTransform),
    Physics(PhysicsTransform),
}

impl Transform {
    pub fn position(&self) -> Vec2 {
        match self {
            Transform::Kinematic(k) => k.position,
            Transform::Physics(p) => p.position,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        match self {
            Transform::Kinematic(k) => k.velocity,
            Transform::Physics(p) => p.velocity,
        }
    }

    pub fn angle(&self) -> f32 {
        match self {
            Transform::Kinematic(k) => k.angle,
            Transform::Physics(p) => p.angle,
        }
    }

    pub fn angular_velocity(&self) -> f32 {
        match self {
            Transform::Kinematic(k) => k.angular_velocity,
            Transform::Physics(p) => p.angular_velocity,
        }
    }

    /// Kinematic transforms have unit mass
    pub fn mass(&self) -> f32 {
        match self {
            Transform::Kinematic(_) => 1.0,
            Transform::Physics(p) => p.mass,
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        match self {
            Transform::Kinematic(k) => k.pending_force += force,
            Transform::Physics(p) => p.apply_force(force),
        }
    }

    pub fn apply_torque(&mut self, torque: f32) {
        match self {
            Transform::Kinematic(k) => k.pending_torque += torque,
            Transform::Physics(p) => p.apply_torque(torque),
        }
    }

    pub fn scale_angular_velocity(&mut self, factor: f32) {
        match self {
            Transform::Kinematic(k) => k.angular_velocity *= factor,
            Transform::Physics(p) => p.scale_angular_velocity(factor),
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        match self {
            Transform::Kinematic(k) => k.position = position,
            Transform::Physics(p) => p.set_position(position),
        }
    }

    /// Integrates kinematic motion. Physics-backed state is advanced by the world step.
    pub fn update(&mut self, dt: f32) {
        if let Transform::Kinematic(k) = self {
            k.update(dt);
        }
    }

    pub fn as_physics_mut(&mut self) -> Option<&mut PhysicsTransform> {
        match self {
            Transform::Physics(p) => Some(p),
            Transform::Kinematic(_) => None,
        }
    }

    pub fn as_physics(&self) -> Option<&PhysicsTransform> {
        match self {
            Transform::Physics(p) => Some(p),
            Transform::Kinematic(_) => None,
        }
    }
}
