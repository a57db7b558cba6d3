//! Fixed-timestep frame loop that drives a scheduler.
//!
//! Each frame runs the registered hooks in a fixed order and ticks the
//! scheduler once, right after the update hooks and before the late-update
//! hooks:
//!
//! 1. frame begin
//! 2. fixed update, as many times as the accumulated lag allows, up to a
//!    per-frame limit; lag beyond the limit is dropped
//! 3. update
//! 4. scheduler tick
//! 5. late update
//! 6. render
//! 7. frame end
//!
//! The loop keeps going until a hook sets [`ControlFlow::Exit`] or a scheduled
//! task fails.

use crate::error::LoopError;
use crate::runtime::Scheduler;

use log::{debug, trace, warn};

use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Whether the frame loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlFlow {
    #[default]
    Running,
    Exit,
}

/// Platform layer plugged into a frame loop with [`LoopBuilder::with_backend`].
///
/// `poll_events` runs at the start of every frame, `render` once per frame
/// after the late-update hooks.
///
/// [`LoopBuilder::with_backend`]: crate::LoopBuilder::with_backend
pub trait Backend {
    fn setup(&mut self, cf: &mut ControlFlow);
    fn teardown(&mut self);
    fn poll_events(&mut self, cf: &mut ControlFlow);
    fn render(&mut self);
}

pub(crate) type FlowHook = Box<dyn FnMut(&mut ControlFlow)>;
pub(crate) type UpdateHook = Box<dyn FnMut(f32, &mut ControlFlow)>;
pub(crate) type PlainHook = Box<dyn FnMut()>;

/// Callbacks registered through [`LoopBuilder`], grouped by phase.
///
/// [`LoopBuilder`]: crate::LoopBuilder
#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) setup: Vec<FlowHook>,
    pub(crate) teardown: Vec<PlainHook>,
    pub(crate) frame_begin: Vec<FlowHook>,
    pub(crate) frame_end: Vec<FlowHook>,
    pub(crate) fixed_update: Vec<UpdateHook>,
    pub(crate) update: Vec<UpdateHook>,
    pub(crate) late_update: Vec<UpdateHook>,
    pub(crate) render: Vec<PlainHook>,
}

/// A configured frame loop, built with [`LoopBuilder`].
///
/// [`LoopBuilder`]: crate::LoopBuilder
pub struct FrameLoop {
    fps: f32,
    ups: f32,
    max_fixed_steps: u32,
    scheduler: Rc<Scheduler>,
    hooks: Hooks,
}

impl FrameLoop {
    pub(crate) fn new(
        fps: f32,
        ups: f32,
        max_fixed_steps: u32,
        scheduler: Rc<Scheduler>,
        hooks: Hooks,
    ) -> Self {
        Self {
            fps,
            ups,
            max_fixed_steps,
            scheduler,
            hooks,
        }
    }

    /// The scheduler ticked once per frame.
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Runs setup, then frames until exit, then teardown.
    ///
    /// Teardown hooks run even when a task failure ends the loop early; the
    /// failure is returned afterwards.
    pub fn run(&mut self) -> Result<(), LoopError> {
        let mut cf = ControlFlow::Running;

        debug!("frame loop starting (fps cap {}, {} updates/s)", self.fps, self.ups);

        for hook in &mut self.hooks.setup {
            hook(&mut cf);
        }

        let result = self.frames(&mut cf);

        if let Err(err) = &result {
            warn!("frame loop stopped early: {err}");
        }

        for hook in &mut self.hooks.teardown {
            hook();
        }

        debug!("frame loop finished");

        result
    }

    fn frames(&mut self, cf: &mut ControlFlow) -> Result<(), LoopError> {
        let fixed_delta = 1.0 / self.ups;
        let frame_budget = (self.fps > 0.0).then(|| Duration::from_secs_f32(1.0 / self.fps));

        let mut last = Instant::now();
        let mut lag = 0.0_f32;

        while *cf == ControlFlow::Running {
            let start = Instant::now();
            let delta = start.duration_since(last).as_secs_f32();
            last = start;
            lag += delta;

            for hook in &mut self.hooks.frame_begin {
                hook(&mut *cf);
            }

            let mut steps = 0;
            while lag >= fixed_delta {
                if steps == self.max_fixed_steps {
                    trace!("dropping {lag}s of fixed update lag after {steps} steps");
                    lag = 0.0;
                    break;
                }

                for hook in &mut self.hooks.fixed_update {
                    hook(fixed_delta, &mut *cf);
                }
                lag -= fixed_delta;
                steps += 1;
            }

            for hook in &mut self.hooks.update {
                hook(delta, &mut *cf);
            }

            self.scheduler.tick()?;

            for hook in &mut self.hooks.late_update {
                hook(delta, &mut *cf);
            }

            for hook in &mut self.hooks.render {
                hook();
            }

            for hook in &mut self.hooks.frame_end {
                hook(&mut *cf);
            }

            if let Some(budget) = frame_budget {
                let spent = start.elapsed();
                if spent < budget {
                    thread::sleep(budget - spent);
                }
            }
        }

        Ok(())
    }
}
