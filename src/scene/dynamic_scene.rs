use crate::camera::Camera;
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::physics::{ContactEvent, PhysicsWorld};
use crate::render::RenderTarget;
use crate::scene::Scene;
use glam::Vec2;
use log::debug;
use std::collections::HashMap;

/// Ordered, duplicate-free entity list plus the physics world owning their bodies.
///
/// Insertion order is update and render order; there is no depth sort.
#[derive(Debug, Default)]
pub struct DynamicScene {
    entities: Vec<Entity>,
    physics: PhysicsWorld,
}

impl DynamicScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity unless one with the same id is already present.
    ///
    /// A physics-backed entity gets its body registered here, exactly once. Fails if the
    /// body belongs to another scene's world.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<bool> {
        if self.contains(entity.id()) {
            return Ok(false);
        }

        let owner = entity.id().raw();
        if let Some(body) = entity.transform.as_physics_mut() {
            self.physics.register(body, owner)?;
        }

        self.entities.push(entity);
        Ok(true)
    }

    /// Adds every entity in order; returns how many were new
    pub fn add_entities(&mut self, entities: impl IntoIterator<Item = Entity>) -> Result<usize> {
        let mut added = 0;
        for entity in entities {
            if self.add_entity(entity)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id() == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Removes one entity, deregistering its body
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        let mut entity = self.entities.remove(index);
        if let Some(body) = entity.transform.as_physics_mut() {
            self.physics.deregister(body);
        }
        Some(entity)
    }

    /// Removes every entity tagged `tag` and deregisters their bodies. Returns the count.
    pub fn remove_by_tag(&mut self, tag: &str) -> usize {
        let physics = &mut self.physics;
        let before = self.entities.len();

        self.entities.retain_mut(|entity| {
            if entity.tag != tag {
                return true;
            }
            if let Some(body) = entity.transform.as_physics_mut() {
                physics.deregister(body);
            }
            false
        });

        before - self.entities.len()
    }

    /// Forwards contact starts and stops to the controllers of the entities involved.
    ///
    /// Impact energy uses the velocities from before the step, relative to the other body
    /// (terrain is at rest).
    fn dispatch_contacts(&mut self, events: &[ContactEvent]) {
        let index: HashMap<u64, usize> = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id().raw(), i))
            .collect();
        let velocity_of = |owner: u64, entities: &[Entity]| {
            index
                .get(&owner)
                .map_or(Vec2::ZERO, |i| entities[*i].transform.velocity())
        };

        for event in events {
            for (own, other) in [(event.owner_a, event.owner_b), (event.owner_b, event.owner_a)] {
                let Some(&i) = index.get(&own) else {
                    continue;
                };
                let relative = velocity_of(own, &self.entities) - velocity_of(other, &self.entities);
                let entity = &mut self.entities[i];
                let mass = entity.transform.mass();

                let Some(controller) = entity.controller.as_mut() else {
                    continue;
                };
                if event.started {
                    let energy = 0.5 * mass * relative.length_squared();
                    if let Some(hit) = controller.on_contact_started(event.key, energy) {
                        debug!(
                            "Entity '{}' took {} impact damage",
                            entity.tag, hit.damage_dealt
                        );
                    }
                } else {
                    controller.on_contact_stopped(event.key);
                }
            }
        }
    }
}

impl Scene for DynamicScene {
    /// Updates every entity (queueing their forces), steps the physics world by `dt`, then
    /// hands out contacts and copies the simulated state back into the transforms.
    fn update(&mut self, dt: f32) {
        for entity in &mut self.entities {
            entity.update(dt);
        }

        for entity in &mut self.entities {
            if let Some(body) = entity.transform.as_physics_mut() {
                self.physics.flush(body);
            }
        }
        self.physics.step(dt);

        let contacts = self.physics.drain_contacts();
        if !contacts.is_empty() {
            self.dispatch_contacts(&contacts);
        }

        for entity in &mut self.entities {
            if let Some(body) = entity.transform.as_physics_mut() {
                self.physics.sync(body);
            }
        }
    }

    fn render(&self, camera: &Camera, target: &mut dyn RenderTarget) {
        for entity in &self.entities {
            entity.render(camera.position, target);
        }
    }
}
