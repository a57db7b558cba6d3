//! Fluent builder for frame loop construction.
//!
//! Collects the frame rate settings, the scheduler to drive and the phase
//! hooks, then validates everything in [`LoopBuilder::build`].

use crate::error::ConfigError;
use crate::runtime::driver::Hooks;
use crate::runtime::{Backend, ControlFlow, FrameLoop, Scheduler};

use std::cell::RefCell;
use std::rc::Rc;

const DEFAULT_UPS: f32 = 50.0;
const DEFAULT_MAX_FIXED_STEPS: u32 = 10;

/// Builder for [`FrameLoop`] instances.
///
/// # Example
/// ```ignore
/// let mut frame_loop = LoopBuilder::new()
///     .with_fps(60.0)
///     .on_update(|_dt, cf| *cf = ControlFlow::Exit)
///     .build()?;
///
/// frame_loop.run()?;
/// ```
pub struct LoopBuilder {
    fps: f32,
    ups: f32,
    max_fixed_steps: u32,
    scheduler: Option<Rc<Scheduler>>,
    hooks: Hooks,
}

impl Default for LoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopBuilder {
    /// Creates a builder with an uncapped frame rate and 50 fixed updates per second.
    pub fn new() -> Self {
        Self {
            fps: 0.0,
            ups: DEFAULT_UPS,
            max_fixed_steps: DEFAULT_MAX_FIXED_STEPS,
            scheduler: None,
            hooks: Hooks::default(),
        }
    }

    /// Caps the frame rate. Zero leaves it uncapped.
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Sets how many fixed updates run per second.
    pub fn with_ups(mut self, ups: f32) -> Self {
        self.ups = ups;
        self
    }

    /// Limits how many fixed updates a single frame may run (10 by default).
    ///
    /// Lag left over once the limit is hit is dropped instead of carried into
    /// the next frame.
    pub fn with_max_fixed_steps(mut self, steps: u32) -> Self {
        self.max_fixed_steps = steps;
        self
    }

    /// Wires a backend's setup, teardown, event polling and rendering into the loop.
    ///
    /// Event polling runs as a frame-begin hook. The caller keeps its own
    /// handle to inspect the backend after the loop ends.
    pub fn with_backend<B: Backend + 'static>(mut self, backend: Rc<RefCell<B>>) -> Self {
        let b = backend.clone();
        self.hooks
            .setup
            .push(Box::new(move |cf: &mut ControlFlow| b.borrow_mut().setup(cf)));
        let b = backend.clone();
        self.hooks
            .frame_begin
            .push(Box::new(move |cf: &mut ControlFlow| b.borrow_mut().poll_events(cf)));
        let b = backend.clone();
        self.hooks.render.push(Box::new(move || b.borrow_mut().render()));
        self.hooks
            .teardown
            .push(Box::new(move || backend.borrow_mut().teardown()));

        self
    }

    /// Drives `scheduler` instead of the thread's main scheduler.
    pub fn with_scheduler(mut self, scheduler: Rc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn on_setup(mut self, hook: impl FnMut(&mut ControlFlow) + 'static) -> Self {
        self.hooks.setup.push(Box::new(hook));
        self
    }

    pub fn on_teardown(mut self, hook: impl FnMut() + 'static) -> Self {
        self.hooks.teardown.push(Box::new(hook));
        self
    }

    pub fn on_frame_begin(mut self, hook: impl FnMut(&mut ControlFlow) + 'static) -> Self {
        self.hooks.frame_begin.push(Box::new(hook));
        self
    }

    pub fn on_frame_end(mut self, hook: impl FnMut(&mut ControlFlow) + 'static) -> Self {
        self.hooks.frame_end.push(Box::new(hook));
        self
    }

    /// Registers a hook called with the fixed timestep, zero or more times per frame.
    pub fn on_fixed_update(mut self, hook: impl FnMut(f32, &mut ControlFlow) + 'static) -> Self {
        self.hooks.fixed_update.push(Box::new(hook));
        self
    }

    /// Registers a hook called once per frame, before the scheduler tick.
    pub fn on_update(mut self, hook: impl FnMut(f32, &mut ControlFlow) + 'static) -> Self {
        self.hooks.update.push(Box::new(hook));
        self
    }

    /// Registers a hook called once per frame, after the scheduler tick.
    pub fn on_late_update(mut self, hook: impl FnMut(f32, &mut ControlFlow) + 'static) -> Self {
        self.hooks.late_update.push(Box::new(hook));
        self
    }

    pub fn on_render(mut self, hook: impl FnMut() + 'static) -> Self {
        self.hooks.render.push(Box::new(hook));
        self
    }

    /// Validates the configuration and builds the loop.
    ///
    /// # Errors
    /// [`ConfigError::InvalidFps`] if `fps` is negative or not finite,
    /// [`ConfigError::InvalidUps`] if `ups` is not finite, not positive or exceeds
    /// a non-zero `fps`, [`ConfigError::NoFixedSteps`] if the per-frame fixed
    /// step limit is zero.
    pub fn build(self) -> Result<FrameLoop, ConfigError> {
        if !self.fps.is_finite() || self.fps < 0.0 {
            return Err(ConfigError::InvalidFps(self.fps));
        }

        if !self.ups.is_finite() || self.ups <= 0.0 || (self.fps > 0.0 && self.ups > self.fps) {
            return Err(ConfigError::InvalidUps {
                ups: self.ups,
                fps: self.fps,
            });
        }

        if self.max_fixed_steps == 0 {
            return Err(ConfigError::NoFixedSteps);
        }

        let scheduler = self.scheduler.unwrap_or_else(Scheduler::main);

        Ok(FrameLoop::new(
            self.fps,
            self.ups,
            self.max_fixed_steps,
            scheduler,
            self.hooks,
        ))
    }
}
