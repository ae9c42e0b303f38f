use crate::animation::AnimationData;
use crate::assets::Assets;
use crate::entity::Entity;
use crate::error::{GameError, Result};
use crate::sprite::{RenderTechnique, SpriteView};
use crate::transform::{BodyDef, KinematicTransform, PhysicsTransform, ShapeDef, Transform};
use glam::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One entity as written in a level file: a `type` tag plus that type's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    /// Drawn behind the terrain
    #[serde(default)]
    pub background: bool,
    /// Defaults to the type name
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl EntityDescriptor {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        EntityDescriptor {
            kind: kind.into(),
            background: false,
            tag: None,
            params: match params {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.kind)
    }

    /// Deserialises the parameters into the kind's parameter struct
    pub fn params<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.params.clone())).map_err(|source| {
            GameError::InvalidEntityParams {
                kind: self.kind.clone(),
                source,
            }
        })
    }
}

/// Builds an entity from its descriptor
pub type Constructor = fn(&EntityDescriptor, &Assets) -> Result<Entity>;

/// Registry of entity kinds.
///
/// Level files only ever name kinds; this is the single place that knows how to turn a
/// kind into an entity.
pub struct EntityFactory {
    constructors: HashMap<String, Constructor>,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::create_default()
    }
}

impl EntityFactory {
    /// Creates an empty factory
    pub fn new() -> Self {
        EntityFactory {
            constructors: HashMap::new(),
        }
    }

    /// Creates a factory with the built-in kinds registered
    pub fn create_default() -> Self {
        let mut factory = Self::new();
        factory.constructors.insert("static_sprite".to_string(), build_static_sprite);
        factory.constructors.insert("animated_sprite".to_string(), build_animated_sprite);
        factory.constructors.insert("drifter".to_string(), build_drifter);
        factory.constructors.insert("rock".to_string(), build_rock);
        factory
    }

    /// Registers a new kind. Returns error if the kind already exists.
    pub fn register(&mut self, kind: impl Into<String>, constructor: Constructor) -> Result<()> {
        let kind = kind.into();
        if self.constructors.contains_key(&kind) {
            return Err(GameError::DuplicateEntityType(kind));
        }
        self.constructors.insert(kind, constructor);
        Ok(())
    }

    pub fn exists(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Builds the entity and reports whether it belongs to the background layer
    pub fn create(&self, descriptor: &EntityDescriptor, assets: &Assets) -> Result<(Entity, bool)> {
        let constructor = self
            .constructors
            .get(&descriptor.kind)
            .ok_or_else(|| GameError::UnknownEntityType(descriptor.kind.clone()))?;

        let mut entity = constructor(descriptor, assets)?;
        entity.tag = descriptor.tag().to_string();
        Ok((entity, descriptor.background))
    }
}

#[derive(Debug, Deserialize)]
struct StaticSpriteParams {
    surface: String,
    position: Vec2,
    /// Degrees
    #[serde(default)]
    angle: f32,
    #[serde(default)]
    technique: RenderTechnique,
}

fn build_static_sprite(descriptor: &EntityDescriptor, assets: &Assets) -> Result<Entity> {
    let params: StaticSpriteParams = descriptor.params()?;
    let sprite = SpriteView::still(assets.surface(&params.surface)?.clone(), params.technique)?;
    let transform = KinematicTransform::new(params.position, params.angle.to_radians());

    Ok(Entity::new(
        descriptor.tag(),
        Transform::Kinematic(transform),
        sprite,
    ))
}

#[derive(Debug, Deserialize)]
struct AnimatedSpriteParams {
    animation: AnimationData,
    position: Vec2,
    #[serde(default)]
    angle: f32,
    #[serde(default)]
    technique: RenderTechnique,
}

fn build_animated_sprite(descriptor: &EntityDescriptor, assets: &Assets) -> Result<Entity> {
    let params: AnimatedSpriteParams = descriptor.params()?;
    let sprite = params.animation.build(assets, params.technique)?;
    let transform = KinematicTransform::new(params.position, params.angle.to_radians());

    Ok(Entity::new(
        descriptor.tag(),
        Transform::Kinematic(transform),
        sprite,
    ))
}

/// Fish, jellyfish, bubbles: kinematic motion with damping
#[derive(Debug, Deserialize)]
struct DrifterParams {
    #[serde(default)]
    surface: Option<String>,
    #[serde(default)]
    animation: Option<AnimationData>,
    position: Vec2,
    #[serde(default)]
    velocity: Vec2,
    /// Degrees per second
    #[serde(default)]
    spin: f32,
    #[serde(default = "no_damping")]
    damping: f32,
    #[serde(default)]
    technique: RenderTechnique,
    /// Flip the sprite when heading left
    #[serde(default)]
    flip: bool,
}

fn no_damping() -> f32 {
    1.0
}

fn build_drifter(descriptor: &EntityDescriptor, assets: &Assets) -> Result<Entity> {
    let params: DrifterParams = descriptor.params()?;

    let mut sprite = match (&params.animation, &params.surface) {
        (Some(animation), _) => animation.build(assets, params.technique)?,
        (None, Some(surface)) => SpriteView::still(assets.surface(surface)?.clone(), params.technique)?,
        (None, None) => {
            return Err(GameError::InvalidAnimation(format!(
                "{} needs a surface or an animation",
                descriptor.kind
            )));
        }
    };
    sprite.flip_with_heading = params.flip;

    let heading = params.velocity.y.atan2(params.velocity.x);
    let transform = KinematicTransform::new(params.position, heading)
        .with_velocity(params.velocity)
        .with_angular_velocity(params.spin.to_radians())
        .with_damping(params.damping, params.damping);

    Ok(Entity::new(
        descriptor.tag(),
        Transform::Kinematic(transform),
        sprite,
    ))
}

/// Loose boulder the player can push around and crash into
#[derive(Debug, Deserialize)]
struct RockParams {
    surface: String,
    position: Vec2,
    radius: f32,
    #[serde(default = "rock_density")]
    density: f32,
    #[serde(default)]
    angle: f32,
    #[serde(default = "rotated")]
    technique: RenderTechnique,
}

fn rock_density() -> f32 {
    2.0
}

fn rotated() -> RenderTechnique {
    RenderTechnique::Rotated
}

fn build_rock(descriptor: &EntityDescriptor, assets: &Assets) -> Result<Entity> {
    let params: RockParams = descriptor.params()?;
    let sprite = SpriteView::still(assets.surface(&params.surface)?.clone(), params.technique)?;
    let body = BodyDef {
        shape: ShapeDef::Ball {
            radius: params.radius,
        },
        density: params.density,
        linear_damping: 1.5,
        angular_damping: 1.5,
        fixed: false,
    };

    Ok(Entity::new(
        descriptor.tag(),
        Transform::Physics(PhysicsTransform::new(
            body,
            params.position,
            params.angle.to_radians(),
        )),
        sprite,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Surface;
    use serde_json::json;

    fn assets() -> Assets {
        let mut assets = Assets::new();
        assets.insert_surface(Surface::new("kelp", 16, 32));
        assets.insert_surface(Surface::new("boulder", 20, 20).with_rotation_cache(36));
        assets.insert_surface(Surface::new("fish_1", 12, 6));
        assets.insert_surface(Surface::new("fish_2", 12, 6));
        assets
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let factory = EntityFactory::create_default();
        let descriptor = EntityDescriptor::new("dragon", json!({}));

        assert!(matches!(
            factory.create(&descriptor, &assets()),
            Err(GameError::UnknownEntityType(kind)) if kind == "dragon"
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut factory = EntityFactory::create_default();
        assert!(matches!(
            factory.register("rock", build_rock),
            Err(GameError::DuplicateEntityType(_))
        ));
        assert!(factory.register("boulder", build_rock).is_ok());
        assert!(factory.exists("boulder"));
    }

    #[test]
    fn test_static_sprite_from_json() {
        let descriptor: EntityDescriptor = serde_json::from_str(
            r#"{ "type": "static_sprite", "background": true, "surface": "kelp", "position": [40, 60], "angle": 90 }"#,
        )
        .unwrap();

        let (entity, background) = EntityFactory::default().create(&descriptor, &assets()).unwrap();
        assert!(background);
        assert_eq!(entity.tag, "static_sprite");
        assert_eq!(entity.position(), Vec2::new(40.0, 60.0));
        approx::assert_relative_eq!(entity.angle(), std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_rock_is_physics_backed_and_tagged() {
        let mut descriptor = EntityDescriptor::new(
            "rock",
            json!({ "surface": "boulder", "position": [100, 50], "radius": 10, "technique": "cached" }),
        );
        descriptor.tag = Some("gate".to_string());

        let (entity, background) = EntityFactory::default().create(&descriptor, &assets()).unwrap();
        assert!(!background);
        assert_eq!(entity.tag, "gate");
        assert!(entity.transform.as_physics().is_some());
        assert_eq!(entity.sprite.technique(), RenderTechnique::Cached);
    }

    #[test]
    fn test_animated_drifter() {
        let descriptor = EntityDescriptor::new(
            "drifter",
            json!({
                "animation": { "frames": ["fish_1", "fish_2"], "durations": [0.3, 0.3] },
                "position": [0, 0], "velocity": [-10, 0], "flip": true
            }),
        );

        let (mut entity, _) = EntityFactory::default().create(&descriptor, &assets()).unwrap();
        entity.update(0.5);

        assert_eq!(entity.position(), Vec2::new(-5.0, 0.0));
        assert_eq!(entity.sprite.current_frame(), 1);
        assert!(entity.sprite.flip_vertical);
    }

    #[test]
    fn test_bad_params_name_the_kind() {
        let descriptor = EntityDescriptor::new("rock", json!({ "surface": "boulder" }));

        assert!(matches!(
            EntityFactory::default().create(&descriptor, &assets()),
            Err(GameError::InvalidEntityParams { kind, .. }) if kind == "rock"
        ));
    }

    #[test]
    fn test_missing_surface_is_fatal() {
        let descriptor = EntityDescriptor::new(
            "static_sprite",
            json!({ "surface": "coral", "position": [0, 0] }),
        );

        assert!(matches!(
            EntityFactory::default().create(&descriptor, &assets()),
            Err(GameError::MissingAsset { .. })
        ));
    }
}
