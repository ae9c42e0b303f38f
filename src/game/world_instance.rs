use crate::error::Result;
use crate::game::world::{WorldController, WorldState};
use crate::input_system::{InputContext, InputSystem};
use crate::instance::{Instance, InstanceContext};
use log::info;

/// Runs a [`WorldController`] under the instance scheduler.
///
/// Each frame: input, intent, world tick, render. A quit event stops the instance.
pub struct WorldInstance {
    world: WorldController,
    input: InputSystem,
    first_level: String,
    fps: u32,
}

impl WorldInstance {
    pub fn new(world: WorldController, input: InputSystem, first_level: impl Into<String>, fps: u32) -> Self {
        WorldInstance {
            world,
            input,
            first_level: first_level.into(),
            fps,
        }
    }

    pub fn world(&self) -> &WorldController {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldController {
        &mut self.world
    }

    pub fn input(&self) -> &InputSystem {
        &self.input
    }
}

impl Instance for WorldInstance {
    fn name(&self) -> &str {
        "world"
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn setup(&mut self, ctx: &mut InstanceContext) -> Result<()> {
        self.world.load(&self.first_level, ctx.audio)?;
        self.world.render(ctx.target);
        Ok(())
    }

    fn update(&mut self, ctx: &mut InstanceContext) -> Result<()> {
        self.input.handle_all(ctx.events);
        if self.input.quit_requested() {
            info!("Quit requested");
            ctx.request_stop();
            return Ok(());
        }

        self.input.context = match self.world.state() {
            WorldState::Transitioning => InputContext::Transition,
            _ => InputContext::Playing,
        };
        let intent = self.input.intent(self.world.camera());
        self.world.set_player_intent(intent);

        self.world.tick(ctx.delta, ctx.audio)?;
        self.world.render(ctx.target);
        Ok(())
    }

    fn finish(&mut self, ctx: &mut InstanceContext) -> Result<()> {
        self.world.stop_music(ctx.audio);
        Ok(())
    }
}
