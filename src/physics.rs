//! Rigid-body simulation owned by a dynamic scene
//!
//! Wraps the rapier2d sets and pipeline behind the handful of operations the core needs:
//! register/deregister a physics-backed transform, push queued inputs into the bodies,
//! step, read state back, and collect contact start/stop events.
//!
//! # Ownership
//!
//! Every `PhysicsWorld` gets a unique id. A `PhysicsTransform` remembers the id of the world
//! it is registered in and refuses to be registered in any other one.
//!
//! Units are pixels and seconds. The world has no gravity (top-down view).

use crate::error::{GameError, Result};
use crate::tile::CollisionGrid;
use crate::transform::{BodyDef, BodyState, PhysicsTransform, ShapeDef};
use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

/// Identifies one pair of touching colliders for the lifetime of the contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactKey(u64);

impl ContactKey {
    fn from_pair(a: ColliderHandle, b: ColliderHandle) -> Self {
        let (a, _) = a.into_raw_parts();
        let (b, _) = b.into_raw_parts();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        ContactKey(((high as u64) << 32) | low as u64)
    }

    #[cfg(test)]
    pub(crate) fn for_test(raw: u64) -> Self {
        ContactKey(raw)
    }
}

/// A contact between two colliders started or stopped during the last step.
///
/// `owner_a` / `owner_b` are the `user_data` of the colliders: the owning entity id for
/// entity bodies, 0 for terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub key: ContactKey,
    pub owner_a: u64,
    pub owner_b: u64,
    pub started: bool,
}

#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<ContactEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let (h1, h2) = (event.collider1(), event.collider2());
        let owner = |h: ColliderHandle| colliders.get(h).map_or(0, |c| c.user_data as u64);

        let contact = ContactEvent {
            key: ContactKey::from_pair(h1, h2),
            owner_a: owner(h1),
            owner_b: owner(h2),
            started: event.started(),
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(contact);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

pub struct PhysicsWorld {
    id: WorldId,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    contacts: ContactCollector,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("id", &self.id)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .finish()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        PhysicsWorld {
            id: WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed)),
            gravity: vector![0.0, 0.0],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            contacts: ContactCollector::default(),
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Creates the rigid body and colliders for `transform`.
    ///
    /// Returns `Ok(false)` if it is already registered here, `ForeignBody` if it belongs to
    /// another world.
    pub fn register(&mut self, transform: &mut PhysicsTransform, owner: u64) -> Result<bool> {
        if let BodyState::Registered { world, .. } = transform.state {
            return if world == self.id {
                Ok(false)
            } else {
                Err(GameError::ForeignBody)
            };
        }

        let def = &transform.def;
        let builder = if def.fixed {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .translation(vector![transform.position.x, transform.position.y])
            .rotation(transform.angle)
            .linvel(vector![transform.velocity.x, transform.velocity.y])
            .angvel(transform.angular_velocity)
            .linear_damping(def.linear_damping)
            .angular_damping(def.angular_damping)
            .build();
        let handle = self.bodies.insert(body);

        let collider = collider_for(def)
            .user_data(owner as u128)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        // Body mass is only recomputed on the next step; the collider knows it already
        transform.mass = collider.mass();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        transform.state = BodyState::Registered {
            world: self.id,
            body: handle,
        };

        Ok(true)
    }

    /// Removes the body and its colliders. The transform keeps its last state and may be
    /// registered again, here or elsewhere.
    pub fn deregister(&mut self, transform: &mut PhysicsTransform) {
        if let BodyState::Registered { world, body } = transform.state {
            if world != self.id {
                return;
            }
            self.bodies.remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
            transform.state = BodyState::Unregistered;
        }
    }

    /// Pushes the inputs queued on `transform` since the last step into its body
    pub fn flush(&mut self, transform: &mut PhysicsTransform) {
        let Some(handle) = self.handle_of(transform) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };

        let pending = transform.take_pending();
        body.reset_forces(false);
        body.reset_torques(false);
        body.add_force(vector![pending.force.x, pending.force.y], true);
        body.add_torque(pending.torque, true);
        if pending.angular_scale != 1.0 {
            body.set_angvel(body.angvel() * pending.angular_scale, true);
        }
        if let Some(position) = pending.teleport {
            body.set_translation(vector![position.x, position.y], true);
            body.set_linvel(vector![0.0, 0.0], true);
        }
    }

    /// Copies the body's state back into `transform`
    pub fn sync(&self, transform: &mut PhysicsTransform) {
        let Some(body) = self
            .handle_of(transform)
            .and_then(|handle| self.bodies.get(handle))
        else {
            return;
        };

        let translation = body.translation();
        let velocity = body.linvel();
        transform.position = Vec2::new(translation.x, translation.y);
        transform.velocity = Vec2::new(velocity.x, velocity.y);
        transform.angle = body.rotation().angle();
        transform.angular_velocity = body.angvel();
        transform.mass = body.mass();
    }

    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.contacts,
        );
    }

    /// Contact events produced by the steps since the last drain
    pub fn drain_contacts(&self) -> Vec<ContactEvent> {
        self.contacts.drain()
    }

    /// Adds fixed colliders for the solid cells of `grid`, one box per horizontal run.
    ///
    /// `pitch` is the size of one cell in world pixels. Returns the number of boxes.
    pub fn add_static_cells(&mut self, grid: &CollisionGrid, pitch: f32) -> usize {
        let mut added = 0;

        for y in 0..grid.height {
            for (start, length) in grid.solid_runs(y) {
                let half = vector![length as f32 * pitch / 2.0, pitch / 2.0];
                let center = vector![start as f32 * pitch + half.x, y as f32 * pitch + half.y];
                let collider = ColliderBuilder::cuboid(half.x, half.y)
                    .translation(center)
                    .active_events(ActiveEvents::COLLISION_EVENTS)
                    .build();
                self.colliders.insert(collider);
                added += 1;
            }
        }

        added
    }

    fn handle_of(&self, transform: &PhysicsTransform) -> Option<RigidBodyHandle> {
        match transform.state {
            BodyState::Registered { world, body } if world == self.id => Some(body),
            _ => None,
        }
    }
}

fn collider_for(def: &BodyDef) -> ColliderBuilder {
    let builder = match def.shape {
        ShapeDef::Ball { radius } => ColliderBuilder::ball(radius),
        ShapeDef::Cuboid { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
    };
    builder.density(def.density)
}
