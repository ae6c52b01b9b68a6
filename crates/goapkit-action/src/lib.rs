//! goapkit Action - Planning templates and runtime actions
//!
//! Actions are split in two by usage:
//! - [`ActionTemplate`]: one immutable description per action type (name,
//!   preconditions, effects), shared by the planner and every agent
//! - [`RuntimeAction`]: a per-agent instance that executes a template over
//!   time and tracks its [`ExecutionState`](goapkit_core::ExecutionState)

pub mod condition;
pub mod effect;
pub mod library;
pub mod runtime;
pub mod template;

pub use condition::{condition, FactAbsent, FactIs, FactPresent, FloatAtLeast, Not, Precondition};
pub use effect::{effect, AddFloat, AddInt, ClearFact, Effect, SetFact};
pub use library::ActionLibrary;
pub use runtime::{
    instantiate, tick_fn, Agent, Behavior, CalledOnceAction, Caller, Immediate, InstanceId,
    LongRunningAction, Pausable, PausableAction, Progress, RuntimeAction, Ticks, Timed, UntilValid,
};
pub use template::{ActionTemplate, ActionTemplateBuilder, RunnerKind, SharedTemplate};
