//! Instance scheduler: a stack of independently clocked runnables
//!
//! # Architecture
//!
//! An instance is a screen or mode (the world, a menu, a cutscene) with a
//! `setup` / `update` / `finish` lifecycle and its own frame rate. Only the top of the stack
//! runs. Pushing a child suspends the parent until the child stops; the parent then resumes
//! on the following step with a fresh clock, so the time the child ran is not fed to it as
//! one huge delta.
//!
//! Stopping is cooperative: an instance asks to stop through its context, and the request
//! is honoured at the top of the next step, never in the middle of a frame.

use crate::audio::AudioSink;
use crate::error::Result;
use crate::input_system::InputEvent;
use crate::render::RenderTarget;
use log::debug;
use std::time::Duration;

/// Longest delta handed to an instance; longer stalls are clamped
const MAX_DELTA: f32 = 0.25;

/// What an instance can reach while it runs
pub struct InstanceContext<'a> {
    /// Seconds since the previous update of this instance
    pub delta: f32,
    pub target: &'a mut dyn RenderTarget,
    pub audio: &'a mut dyn AudioSink,
    /// Window events received since the previous step
    pub events: &'a [InputEvent],
    stop: bool,
    child: Option<Box<dyn Instance>>,
}

impl<'a> InstanceContext<'a> {
    pub(crate) fn new(
        delta: f32,
        target: &'a mut dyn RenderTarget,
        audio: &'a mut dyn AudioSink,
        events: &'a [InputEvent],
    ) -> Self {
        InstanceContext {
            delta,
            target,
            audio,
            events,
            stop: false,
            child: None,
        }
    }

    /// Ends this instance at the start of the next step
    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    /// Suspends this instance and runs `child` until it stops
    pub fn push(&mut self, child: Box<dyn Instance>) {
        self.child = Some(child);
    }
}

pub trait Instance {
    fn name(&self) -> &str;

    /// Updates per second
    fn fps(&self) -> u32 {
        60
    }

    /// Called once, before the first update
    fn setup(&mut self, ctx: &mut InstanceContext) -> Result<()>;

    /// One frame
    fn update(&mut self, ctx: &mut InstanceContext) -> Result<()>;

    /// Called once, when the instance stops
    fn finish(&mut self, _ctx: &mut InstanceContext) -> Result<()> {
        Ok(())
    }
}

/// Per-instance clock measuring the time between two updates
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<Duration>,
}

impl FrameClock {
    /// Seconds since the previous tick, 0 on the first tick after a reset
    pub fn tick(&mut self, now: Duration) -> f32 {
        let delta = self
            .last
            .map_or(0.0, |last| now.saturating_sub(last).as_secs_f32());
        self.last = Some(now);
        delta.min(MAX_DELTA)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

struct Slot {
    instance: Box<dyn Instance>,
    clock: FrameClock,
    started: bool,
    stop_requested: bool,
}

impl Slot {
    fn new(instance: Box<dyn Instance>) -> Self {
        Slot {
            instance,
            clock: FrameClock::default(),
            started: false,
            stop_requested: false,
        }
    }
}

#[derive(Default)]
pub struct InstanceScheduler {
    stack: Vec<Slot>,
}

impl InstanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: Box<dyn Instance>) {
        debug!("Instance pushed: {}", instance.name());
        self.stack.push(Slot::new(instance));
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Name of the instance that runs next
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(|slot| slot.instance.name())
    }

    /// Time the main loop should wait between two steps of the current instance
    pub fn frame_interval(&self) -> Duration {
        let fps = self
            .stack
            .last()
            .map_or(60, |slot| slot.instance.fps())
            .max(1);
        Duration::from_secs_f64(1.0 / fps as f64)
    }

    /// Runs one step of the top instance. `now` is a monotonic timestamp.
    ///
    /// Returns `false` once the stack is empty.
    pub fn step(
        &mut self,
        now: Duration,
        target: &mut dyn RenderTarget,
        audio: &mut dyn AudioSink,
        events: &[InputEvent],
    ) -> Result<bool> {
        let Some(slot) = self.stack.last_mut() else {
            return Ok(false);
        };

        if slot.stop_requested {
            let mut ctx = InstanceContext::new(0.0, target, audio, events);
            slot.instance.finish(&mut ctx)?;
            debug!("Instance finished: {}", slot.instance.name());
            self.stack.pop();

            if let Some(parent) = self.stack.last_mut() {
                parent.clock.reset();
            }
            return Ok(!self.stack.is_empty());
        }

        let mut ctx;
        if !slot.started {
            slot.started = true;
            slot.clock.tick(now);
            ctx = InstanceContext::new(0.0, target, audio, events);
            slot.instance.setup(&mut ctx)?;
        } else {
            let delta = slot.clock.tick(now);
            ctx = InstanceContext::new(delta, target, audio, events);
            slot.instance.update(&mut ctx)?;
        }

        if ctx.stop {
            slot.stop_requested = true;
        }
        if let Some(child) = ctx.child.take() {
            self.push(child);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::render::RecordingTarget;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Logs its lifecycle; stops after `frames` updates and optionally pushes a child on
    /// its first update
    struct Probe {
        name: String,
        log: Log,
        frames: usize,
        updates: usize,
        child: Option<Box<dyn Instance>>,
    }

    impl Probe {
        fn boxed(name: &str, log: &Log, frames: usize) -> Box<Probe> {
            Box::new(Probe {
                name: name.to_string(),
                log: log.clone(),
                frames,
                updates: 0,
                child: None,
            })
        }
    }

    impl Instance for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn fps(&self) -> u32 {
            30
        }

        fn setup(&mut self, _ctx: &mut InstanceContext) -> Result<()> {
            self.log.borrow_mut().push(format!("{} setup", self.name));
            Ok(())
        }

        fn update(&mut self, ctx: &mut InstanceContext) -> Result<()> {
            self.updates += 1;
            self.log
                .borrow_mut()
                .push(format!("{} update {:.2}", self.name, ctx.delta));
            if let Some(child) = self.child.take() {
                ctx.push(child);
            }
            if self.updates >= self.frames {
                ctx.request_stop();
            }
            Ok(())
        }

        fn finish(&mut self, _ctx: &mut InstanceContext) -> Result<()> {
            self.log.borrow_mut().push(format!("{} finish", self.name));
            Ok(())
        }
    }

    fn run(scheduler: &mut InstanceScheduler, steps: u64) -> Vec<bool> {
        let mut target = RecordingTarget::new(10.0, 10.0);
        let mut audio = NullAudio;
        (1..=steps)
            .map(|i| {
                scheduler
                    .step(Duration::from_millis(i * 100), &mut target, &mut audio, &[])
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_lifecycle_order_and_cooperative_stop() {
        let log = Log::default();
        let mut scheduler = InstanceScheduler::new();
        scheduler.push(Probe::boxed("menu", &log, 2));

        let alive = run(&mut scheduler, 5);

        assert_eq!(
            *log.borrow(),
            vec!["menu setup", "menu update 0.10", "menu update 0.10", "menu finish"]
        );
        assert_eq!(alive, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_child_suspends_parent_which_resumes_next_step() {
        let log = Log::default();
        let mut parent = Probe::boxed("world", &log, 3);
        parent.child = Some(Probe::boxed("pause", &log, 1));

        let mut scheduler = InstanceScheduler::new();
        scheduler.push(parent);
        run(&mut scheduler, 7);

        assert_eq!(
            *log.borrow(),
            vec![
                "world setup",
                "world update 0.10",
                "pause setup",
                "pause update 0.10",
                "pause finish",
                "world update 0.00",
                "world update 0.10",
            ]
        );
        assert_eq!(scheduler.current(), Some("world"));
    }

    #[test]
    fn test_frame_interval_follows_top_instance() {
        let log = Log::default();
        let mut scheduler = InstanceScheduler::new();
        assert_eq!(scheduler.frame_interval(), Duration::from_secs_f64(1.0 / 60.0));

        scheduler.push(Probe::boxed("menu", &log, 1));
        assert_eq!(scheduler.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn test_clock_caps_long_stalls() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(Duration::from_secs(1)), 0.0);
        assert_eq!(clock.tick(Duration::from_secs(10)), MAX_DELTA);
        clock.reset();
        assert_eq!(clock.tick(Duration::from_secs(11)), 0.0);
    }
}
