//! Runtime actions: per-agent, stateful handles that execute a template
//!
//! A template describes *what* an action needs and does; a runtime instance
//! tracks one agent's attempt at doing it. Instances are created when an
//! agent's queue activates a template and discarded once finished.

mod behavior;
mod caller;
mod instance;

pub use behavior::{tick_fn, Behavior, FnBehavior, Immediate, Progress, Ticks, Timed, UntilValid};
pub use caller::{Agent, Caller};
pub use instance::{
    instantiate, CalledOnceAction, InstanceId, LongRunningAction, Pausable, PausableAction,
    RuntimeAction,
};
