use crate::camera::Camera;
use crate::movement::MovementIntent;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Actions the player can hold down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Boost,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Boost,
    ];
}

/// Window events, already translated out of the backend's types.
///
/// Keys are named the way SDL names them (`"Z"`, `"Left Shift"`).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    /// Cursor position in screen pixels
    MouseMotion(Vec2),
    Quit,
}

/// Action to key mapping. Every action has exactly one key and no key drives two actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    keys: HashMap<Action, String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = HashMap::from([
            (Action::Up, "Z".to_string()),
            (Action::Down, "S".to_string()),
            (Action::Left, "Q".to_string()),
            (Action::Right, "D".to_string()),
            (Action::Boost, "Left Shift".to_string()),
        ]);
        KeyBindings { keys }
    }
}

impl KeyBindings {
    pub fn key_for(&self, action: Action) -> Option<&str> {
        self.keys.get(&action).map(String::as_str)
    }

    /// Which action, if any, `key` is bound to
    pub fn action_for_key(&self, key: &str) -> Option<Action> {
        self.keys
            .iter()
            .find(|(_, bound)| bound.as_str() == key)
            .map(|(action, _)| *action)
    }

    /// Binds `key` to `action`. If `key` already drove another action, that action takes
    /// over `action`'s previous key.
    pub fn rebind(&mut self, action: Action, key: impl Into<String>) {
        let key = key.into();
        let previous = self.keys.insert(action, key.clone());

        let displaced = self
            .keys
            .iter()
            .find(|(other, bound)| **other != action && **bound == key)
            .map(|(other, _)| *other);
        if let Some(other) = displaced {
            match previous {
                Some(old) => {
                    self.keys.insert(other, old);
                }
                None => {
                    self.keys.remove(&other);
                }
            }
        }
    }
}

/// Input context determines whether held keys drive the vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    /// Normal play: movement and aim go to the player
    Playing,
    /// A level transition is on screen: input is tracked but not forwarded
    Transition,
}

/// Turns window events into one `MovementIntent` per frame.
///
/// Key state persists across frames (a held key keeps producing thrust); the intent built
/// from it is handed to the movement controller, which consumes it.
#[derive(Debug, Clone)]
pub struct InputSystem {
    pub bindings: KeyBindings,
    pub context: InputContext,
    held: HashSet<Action>,
    cursor: Option<Vec2>,
    quit_requested: bool,
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl InputSystem {
    pub fn new(bindings: KeyBindings) -> Self {
        InputSystem {
            bindings,
            context: InputContext::Playing,
            held: HashSet::new(),
            cursor: None,
            quit_requested: false,
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if let Some(action) = self.bindings.action_for_key(key) {
                    self.held.insert(action);
                }
            }
            InputEvent::KeyUp(key) => {
                if let Some(action) = self.bindings.action_for_key(key) {
                    self.held.remove(&action);
                }
            }
            InputEvent::MouseMotion(position) => self.cursor = Some(*position),
            InputEvent::Quit => self.quit_requested = true,
        }
    }

    pub fn handle_all<'a>(&mut self, events: impl IntoIterator<Item = &'a InputEvent>) {
        for event in events {
            self.handle(event);
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Intent for this frame; the cursor is converted to world coordinates through `camera`
    pub fn intent(&self, camera: &Camera) -> MovementIntent {
        if self.context != InputContext::Playing {
            return MovementIntent::default();
        }

        MovementIntent {
            up: self.is_held(Action::Up),
            down: self.is_held(Action::Down),
            left: self.is_held(Action::Left),
            right: self.is_held(Action::Right),
            boost: self.is_held(Action::Boost),
            aim: self.cursor.map(|cursor| camera.to_world(cursor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for_key("Z"), Some(Action::Up));
        assert_eq!(bindings.action_for_key("Left Shift"), Some(Action::Boost));
        assert_eq!(bindings.action_for_key("X"), None);
        assert!(Action::ALL.iter().all(|a| bindings.key_for(*a).is_some()));
    }

    #[test]
    fn test_rebind_swaps_conflicting_key() {
        let mut bindings = KeyBindings::default();
        bindings.rebind(Action::Up, "D");

        assert_eq!(bindings.key_for(Action::Up), Some("D"));
        assert_eq!(bindings.key_for(Action::Right), Some("Z"));
        assert_eq!(bindings.action_for_key("D"), Some(Action::Up));
    }

    #[test]
    fn test_held_keys_build_intent() {
        let mut input = InputSystem::default();
        let mut camera = Camera::new(Vec2::new(400.0, 300.0));
        camera.position = Vec2::new(100.0, 0.0);

        input.handle_all(&[
            InputEvent::KeyDown("Z".to_string()),
            InputEvent::KeyDown("D".to_string()),
            InputEvent::MouseMotion(Vec2::new(50.0, 60.0)),
            InputEvent::KeyUp("Z".to_string()),
        ]);

        let intent = input.intent(&camera);
        assert!(intent.right && !intent.up && !intent.boost);
        assert_eq!(intent.aim, Some(Vec2::new(150.0, 60.0)));

        // Still held next frame
        assert!(input.intent(&camera).right);
    }

    #[test]
    fn test_transition_context_blocks_intent() {
        let mut input = InputSystem::default();
        input.handle(&InputEvent::KeyDown("D".to_string()));
        input.context = InputContext::Transition;

        assert_eq!(
            input.intent(&Camera::new(Vec2::ONE)),
            MovementIntent::default()
        );
    }

    #[test]
    fn test_quit_event() {
        let mut input = InputSystem::default();
        assert!(!input.quit_requested());
        input.handle(&InputEvent::Quit);
        assert!(input.quit_requested());
    }
}
