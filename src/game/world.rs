//! World controller: the level lifecycle
//!
//! # State machine
//!
//! ```text
//! Unloaded --load--> Active --switch_zone / death--> Transitioning
//!                      ^                                  |
//!                      |      frame covers the screen:    |
//!                      +------ load(next), slide out -----+
//! ```
//!
//! While Active, each tick updates the scenes, evaluates the triggers against the player
//! position, and moves the camera. While Transitioning, the world is frozen behind the
//! transition frame: no scene updates and no triggers.
//!
//! A level is three layers, drawn in order: background entities, terrain, foreground
//! entities (which include the player and the terrain colliders).

use crate::assets::Assets;
use crate::audio::AudioSink;
use crate::camera::Camera;
use crate::config::GameConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{GameError, Result};
use crate::game::factory::EntityFactory;
use crate::game::overlay::ScreenFilter;
use crate::game::transition::{Edge, Transition};
use crate::game::trigger::{Trigger, TriggerAction};
use crate::movement::MovementIntent;
use crate::player::spawn_player;
use crate::render::RenderTarget;
use crate::scene::{DynamicScene, Scene, TileScene};
use crate::tile::CollisionGrid;
use crate::visibility::{ConeParams, LightFan, cast_cone};
use glam::Vec2;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldState {
    /// No level loaded yet
    Unloaded,
    Active,
    Transitioning,
}

/// Where the player appears on the next load. `angle` in radians; `None` keeps the level's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub position: Vec2,
    pub angle: Option<f32>,
}

/// The scenes of the loaded level
struct LoadedLevel {
    id: String,
    background: DynamicScene,
    terrain: TileScene,
    foreground: DynamicScene,
    collision: CollisionGrid,
    overlay: Option<ScreenFilter>,
}

pub struct WorldController {
    config: GameConfig,
    assets: Rc<Assets>,
    factory: EntityFactory,
    camera: Camera,
    level: Option<LoadedLevel>,
    triggers: Vec<Trigger>,
    /// Triggers created during the current tick; armed from the next one
    pending_triggers: Vec<Trigger>,
    player: Option<EntityId>,
    spawn_override: Option<Spawn>,
    transition: Option<Transition>,
    /// Level loaded when the transition frame covers the screen
    next_level: Option<String>,
    music: Option<String>,
    rng: StdRng,
    loads: usize,
}

impl WorldController {
    pub fn new(config: GameConfig, assets: Rc<Assets>) -> Result<Self> {
        Self::with_factory(config, assets, EntityFactory::create_default())
    }

    pub fn with_factory(config: GameConfig, assets: Rc<Assets>, factory: EntityFactory) -> Result<Self> {
        config.validate()?;
        let viewport = Vec2::new(config.viewport.width as f32, config.viewport.height as f32);

        Ok(WorldController {
            config,
            assets,
            factory,
            camera: Camera::new(viewport),
            level: None,
            triggers: Vec::new(),
            pending_triggers: Vec::new(),
            player: None,
            spawn_override: None,
            transition: None,
            next_level: None,
            music: None,
            rng: StdRng::from_entropy(),
            loads: 0,
        })
    }

    /// Fixes the transition edge sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> WorldState {
        if self.transition.is_some() {
            WorldState::Transitioning
        } else if self.level.is_some() {
            WorldState::Active
        } else {
            WorldState::Unloaded
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn current_level(&self) -> Option<&str> {
        self.level.as_ref().map(|level| level.id.as_str())
    }

    /// Number of completed level loads
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn spawn_override(&self) -> Option<Spawn> {
        self.spawn_override
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn current_music(&self) -> Option<&str> {
        self.music.as_deref()
    }

    pub fn background(&self) -> Option<&DynamicScene> {
        self.level.as_ref().map(|level| &level.background)
    }

    pub fn foreground(&self) -> Option<&DynamicScene> {
        self.level.as_ref().map(|level| &level.foreground)
    }

    pub fn terrain(&self) -> Option<&TileScene> {
        self.level.as_ref().map(|level| &level.terrain)
    }

    pub fn overlay(&self) -> Option<&ScreenFilter> {
        self.level.as_ref().and_then(|level| level.overlay.as_ref())
    }

    pub fn player(&self) -> Option<&Entity> {
        let id = self.player?;
        self.level.as_ref()?.foreground.get(id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player?;
        self.level.as_mut()?.foreground.get_mut(id)
    }

    /// Hands this frame's input to the player's movement controller
    pub fn set_player_intent(&mut self, intent: MovementIntent) {
        if let Some(controller) = self.player_mut().and_then(|p| p.controller.as_mut()) {
            controller.set_intent(intent);
        }
    }

    /// Moves the player on the next physics step. Returns false when there is no player.
    pub fn teleport_player(&mut self, position: Vec2) -> bool {
        match self.player_mut() {
            Some(player) => {
                player.transform.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Replaces the current level with `level_id`.
    ///
    /// Everything is built and validated before the old level is dropped, so a content error
    /// leaves the world as it was.
    pub fn load(&mut self, level_id: &str, audio: &mut dyn AudioSink) -> Result<()> {
        let assets = Rc::clone(&self.assets);
        let descriptor = assets.level(level_id)?;
        info!("Loading level '{}'", level_id);

        for trigger in &descriptor.triggers {
            self.validate_action(&trigger.action)?;
        }
        if let Some(music) = &descriptor.music {
            assets.require_sound(&music.track)?;
        }
        // Needed later by death and zone switches
        assets.surface(&self.config.transition.surface)?;

        let terrain = TileScene::new(
            assets.tilemap(&descriptor.tilemap)?.clone(),
            assets.atlas(&descriptor.tileset)?.clone(),
            descriptor.tile_pitch,
        )?;
        let collision = terrain.collision_grid();

        let mut background = DynamicScene::new();
        let mut foreground = DynamicScene::new();
        foreground
            .physics_mut()
            .add_static_cells(&collision, terrain.pitch() as f32);

        for entity_descriptor in &descriptor.entities {
            let (entity, is_background) = self.factory.create(entity_descriptor, &assets)?;
            if is_background {
                background.add_entity(entity)?;
            } else {
                foreground.add_entity(entity)?;
            }
        }

        let spawn = self.spawn_override.unwrap_or(Spawn {
            position: descriptor.spawn,
            angle: None,
        });
        let angle = spawn
            .angle
            .unwrap_or_else(|| descriptor.spawn_angle.to_radians());
        let player = spawn_player(&self.config, &assets, spawn.position, angle)?;
        let player_id = player.id();
        foreground.add_entity(player)?;

        let overlay = if descriptor.overlay.enabled {
            let surface = assets.surface(&self.config.overlay.surface)?.clone();
            Some(ScreenFilter::new(surface, &descriptor.overlay))
        } else {
            None
        };

        self.triggers = descriptor.triggers.iter().cloned().map(Trigger::from).collect();
        self.pending_triggers.clear();
        self.player = Some(player_id);
        self.level = Some(LoadedLevel {
            id: level_id.to_string(),
            background,
            terrain,
            foreground,
            collision,
            overlay,
        });

        if let Some(music) = &descriptor.music {
            self.switch_music(&music.track, music.volume, self.config.audio.fade_ms, audio);
        }

        self.follow_player();
        self.loads += 1;
        info!(
            "Level '{}' ready: {} triggers, player at ({:.0}, {:.0})",
            level_id,
            self.triggers.len(),
            spawn.position.x,
            spawn.position.y
        );

        Ok(())
    }

    /// Advances the world by `dt` seconds.
    ///
    /// Fails only when a trigger runs into a content error (or the deferred load does).
    pub fn tick(&mut self, dt: f32, audio: &mut dyn AudioSink) -> Result<()> {
        if let Some(transition) = &mut self.transition {
            transition.update(dt);
            let load_now = transition.take_load_request();
            let completed = transition.is_completed();

            if load_now {
                if let Some(level) = self.next_level.take() {
                    self.load(&level, audio)?;
                }
            }
            if completed {
                debug!("Transition completed");
                self.transition = None;
            }
            return Ok(());
        }

        let Some(level) = &mut self.level else {
            return Ok(());
        };

        if self.player.is_some_and(|id| level.foreground.get(id).is_some_and(Entity::is_dead)) {
            let current = level.id.clone();
            info!("Player died, reloading '{}'", current);
            return self.start_transition(current);
        }

        level.background.update(dt);
        level.terrain.update(dt);
        level.foreground.update(dt);

        if let Some(point) = self.player().map(Entity::position) {
            for i in 0..self.triggers.len() {
                if self.transition.is_some() {
                    break;
                }
                if let Some(action) = self.triggers[i].poll(point) {
                    debug!("Trigger {} fired: {:?}", i, action);
                    self.execute(action, audio)?;
                }
            }
        }
        self.triggers.append(&mut self.pending_triggers);

        self.follow_player();
        Ok(())
    }

    /// Draws the level layers, the overlay with the visibility cone, then the transition
    pub fn render(&self, target: &mut dyn RenderTarget) {
        if let Some(level) = &self.level {
            level.background.render(&self.camera, target);
            level.terrain.render(&self.camera, target);
            level.foreground.render(&self.camera, target);

            if let Some(overlay) = &level.overlay {
                let fan = self.light_fan();
                overlay.render(fan.as_ref(), target);
            }
        }

        if let Some(transition) = &self.transition {
            transition.render(target);
        }
    }

    /// Visibility cone from the player's position along its heading, in screen space
    pub fn light_fan(&self) -> Option<LightFan> {
        let level = self.level.as_ref()?;
        let player = self.player()?;
        let cone = &self.config.cone;

        let params = ConeParams {
            origin: player.position(),
            facing: player.angle(),
            aperture: cone.aperture_deg.to_radians(),
            rays: cone.rays,
            radius: cone.radius,
        };
        let mut fan = cast_cone(&params, &level.collision, level.terrain.pitch() as f32);
        for vertex in &mut fan.vertices {
            *vertex = self.camera.offset(*vertex);
        }
        Some(fan)
    }

    pub fn stop_music(&mut self, audio: &mut dyn AudioSink) {
        if let Some(track) = self.music.take() {
            audio.fade_out(&track, self.config.audio.fade_ms);
        }
    }

    fn execute(&mut self, action: TriggerAction, audio: &mut dyn AudioSink) -> Result<()> {
        match action {
            TriggerAction::SwitchZone { level, spawn, angle } => {
                if self.transition.is_some() {
                    warn!("Ignoring switch to '{}': a transition is in flight", level);
                    return Ok(());
                }
                if let Some(position) = spawn {
                    self.spawn_override = Some(Spawn {
                        position,
                        angle: angle.map(f32::to_radians),
                    });
                }
                self.start_transition(level)
            }
            TriggerAction::SwitchMusic {
                track,
                volume,
                fade_ms,
            } => {
                let fade = fade_ms.unwrap_or(self.config.audio.fade_ms);
                self.switch_music(&track, volume, fade, audio);
                Ok(())
            }
            TriggerAction::AddTrigger { trigger } => {
                self.pending_triggers.push(Trigger::from(*trigger));
                Ok(())
            }
            TriggerAction::RemoveEntities { tag } => {
                if let Some(level) = &mut self.level {
                    let removed =
                        level.background.remove_by_tag(&tag) + level.foreground.remove_by_tag(&tag);
                    debug!("Removed {} entities tagged '{}'", removed, tag);
                }
                Ok(())
            }
            TriggerAction::AddEntity { entity } => {
                let (entity, is_background) = self.factory.create(&entity, &self.assets)?;
                if let Some(level) = &mut self.level {
                    if is_background {
                        level.background.add_entity(entity)?;
                    } else {
                        level.foreground.add_entity(entity)?;
                    }
                }
                Ok(())
            }
            TriggerAction::ChangeMovementProfile { profile } => {
                match self.player_mut().and_then(|p| p.controller.as_mut()) {
                    Some(controller) => controller.set_profile(&profile),
                    None => Ok(()),
                }
            }
        }
    }

    /// Checks that everything a trigger refers to exists
    fn validate_action(&self, action: &TriggerAction) -> Result<()> {
        match action {
            TriggerAction::SwitchZone { level, .. } => self.assets.level(level).map(|_| ()),
            TriggerAction::SwitchMusic { track, .. } => self.assets.require_sound(track),
            TriggerAction::AddTrigger { trigger } => self.validate_action(&trigger.action),
            TriggerAction::RemoveEntities { .. } => Ok(()),
            TriggerAction::AddEntity { entity } => {
                if self.factory.exists(&entity.kind) {
                    Ok(())
                } else {
                    Err(GameError::UnknownEntityType(entity.kind.clone()))
                }
            }
            TriggerAction::ChangeMovementProfile { profile } => {
                if self.config.movement.profiles.contains_key(profile) {
                    Ok(())
                } else {
                    Err(GameError::UnknownProfile(profile.clone()))
                }
            }
        }
    }

    fn start_transition(&mut self, level: String) -> Result<()> {
        if self.transition.is_some() {
            warn!("Ignoring transition to '{}': one is already in flight", level);
            return Ok(());
        }

        let surface = self.assets.surface(&self.config.transition.surface)?.clone();
        let edge = Edge::random(&mut self.rng);
        info!("Transition to '{}' from {:?}", level, edge);

        self.transition = Some(Transition::new(
            surface,
            self.camera.viewport,
            self.config.transition.speed,
            edge,
        ));
        self.next_level = Some(level);
        Ok(())
    }

    /// Plays `track` in a loop; the playing track fades out. Same track is a no-op.
    fn switch_music(&mut self, track: &str, volume: f32, fade_ms: u32, audio: &mut dyn AudioSink) {
        if self.music.as_deref() == Some(track) {
            return;
        }
        if let Some(previous) = self.music.take() {
            audio.fade_out(&previous, fade_ms);
        }
        audio.play(track, volume * self.config.audio.music_volume, None);
        self.music = Some(track.to_string());
    }

    fn follow_player(&mut self) {
        let Some(position) = self.player().map(Entity::position) else {
            return;
        };
        let Some(level) = &mut self.level else {
            return;
        };

        let level_size = level.terrain.pixel_size();
        self.camera.follow(position, level_size);

        if let Some(overlay) = &mut level.overlay {
            overlay.reposition(self.camera.offset(position));
        }
    }
}
