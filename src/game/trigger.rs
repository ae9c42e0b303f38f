//! Triggers: rectangular zones bound to one world action
//!
//! # State machine
//!
//! ```text
//! Armed --point inside--> action executed --persistent--> Armed
//!                                         \-otherwise---> Fired (terminal)
//! ```
//!
//! The action set is closed. An unknown `action` tag is rejected when the level JSON is
//! parsed, so content errors surface before the level ever runs.

use crate::collision::Rect;
use crate::game::factory::EntityDescriptor;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TriggerAction {
    /// Load another level, optionally overriding where the player appears
    SwitchZone {
        level: String,
        #[serde(default)]
        spawn: Option<Vec2>,
        /// Degrees
        #[serde(default)]
        angle: Option<f32>,
    },
    SwitchMusic {
        track: String,
        #[serde(default = "full_volume")]
        volume: f32,
        #[serde(default)]
        fade_ms: Option<u32>,
    },
    AddTrigger { trigger: Box<TriggerDescriptor> },
    RemoveEntities { tag: String },
    AddEntity { entity: EntityDescriptor },
    ChangeMovementProfile { profile: String },
}

fn full_volume() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub rect: Rect,
    /// Fire every tick the point is inside instead of once
    #[serde(default)]
    pub persistent: bool,
    #[serde(flatten)]
    pub action: TriggerAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Armed,
    Fired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    rect: Rect,
    action: TriggerAction,
    persistent: bool,
    used: bool,
}

impl Trigger {
    pub fn new(rect: Rect, action: TriggerAction, persistent: bool) -> Self {
        Trigger {
            rect,
            action,
            persistent,
            used: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn action(&self) -> &TriggerAction {
        &self.action
    }

    pub fn state(&self) -> TriggerState {
        if self.used {
            TriggerState::Fired
        } else {
            TriggerState::Armed
        }
    }

    /// Returns the action to execute if `point` is inside and the trigger is armed.
    /// A non-persistent trigger is spent by this call.
    pub fn poll(&mut self, point: Vec2) -> Option<TriggerAction> {
        if self.used || !self.rect.contains_point(point) {
            return None;
        }
        if !self.persistent {
            self.used = true;
        }
        Some(self.action.clone())
    }
}

impl From<TriggerDescriptor> for Trigger {
    fn from(descriptor: TriggerDescriptor) -> Self {
        Trigger::new(descriptor.rect, descriptor.action, descriptor.persistent)
    }
}
