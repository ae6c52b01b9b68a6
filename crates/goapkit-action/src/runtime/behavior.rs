//! Completion conditions for long-running actions

use goapkit_core::ActionError;

use crate::condition::Precondition;

/// Result of one update tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Working,
    Done,
}

/// Decides when a long-running action has done its work.
///
/// Only ticked while the owning instance is running, so a paused instance
/// makes no progress.
pub trait Behavior<C>: Send {
    /// Called once when the instance starts
    fn on_start(&mut self, _ctx: &C) -> Result<(), ActionError> {
        Ok(())
    }

    fn tick(&mut self, ctx: &C, delta: f32) -> Result<Progress, ActionError>;
}

/// Completes on the first update
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl<C> Behavior<C> for Immediate {
    fn tick(&mut self, _ctx: &C, _delta: f32) -> Result<Progress, ActionError> {
        Ok(Progress::Done)
    }
}

/// Completes once the accumulated update time reaches a duration.
///
/// Deltas are summed in `f32`, so the comparison allows a relative error of
/// `1e-5` of the duration: ten ticks of `0.1` finish a one second timer.
#[derive(Debug, Clone)]
pub struct Timed {
    duration: f32,
    elapsed: f32,
}

impl Timed {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    /// Seconds of work done so far
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl<C> Behavior<C> for Timed {
    fn tick(&mut self, _ctx: &C, delta: f32) -> Result<Progress, ActionError> {
        self.elapsed += delta;
        if self.elapsed >= self.duration - self.duration.abs() * 1e-5 {
            Ok(Progress::Done)
        } else {
            Ok(Progress::Working)
        }
    }
}

/// Completes on the Nth update
#[derive(Debug, Clone)]
pub struct Ticks {
    remaining: u32,
}

impl Ticks {
    pub fn new(count: u32) -> Self {
        Self { remaining: count }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl<C> Behavior<C> for Ticks {
    fn tick(&mut self, _ctx: &C, _delta: f32) -> Result<Progress, ActionError> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Ok(Progress::Done)
        } else {
            Ok(Progress::Working)
        }
    }
}

/// Completes once a condition holds on the caller's context
pub struct UntilValid<P>(pub P);

impl<C, P: Precondition<C>> Behavior<C> for UntilValid<P> {
    fn tick(&mut self, ctx: &C, _delta: f32) -> Result<Progress, ActionError> {
        if self.0.valid(ctx)? {
            Ok(Progress::Done)
        } else {
            Ok(Progress::Working)
        }
    }
}

/// Behaviour backed by a closure. Built with [`tick_fn`].
pub struct FnBehavior<F>(F);

/// Wrap a closure as a [`Behavior`]
pub fn tick_fn<C, F>(f: F) -> FnBehavior<F>
where
    F: FnMut(&C, f32) -> Result<Progress, ActionError> + Send,
{
    FnBehavior(f)
}

impl<C, F> Behavior<C> for FnBehavior<F>
where
    F: FnMut(&C, f32) -> Result<Progress, ActionError> + Send,
{
    fn tick(&mut self, ctx: &C, delta: f32) -> Result<Progress, ActionError> {
        (self.0)(ctx, delta)
    }
}
