// Game module - level content and the world lifecycle
//
// - level.rs: level descriptors as loaded from JSON
// - factory.rs: entity kinds and the registry that builds them
// - trigger.rs: trigger zones and their actions
// - transition.rs: sliding frame between level loads
// - overlay.rs: darkness filter with the visibility cone
// - world.rs: WorldController, the level state machine
// - world_instance.rs: WorldController as a scheduler instance

pub mod factory;
pub mod level;
pub mod overlay;
pub mod transition;
pub mod trigger;
pub mod world;
pub mod world_instance;

pub use world::{WorldController, WorldState};
pub use world_instance::WorldInstance;
