//! goapkit Core - Shared types for the goapkit action layer
//!
//! This crate provides the vocabulary every other goapkit crate speaks:
//! - Facts and the blackboard that preconditions and effects operate on
//! - Agent identity and the execution lifecycle states of runtime actions
//! - The error type all action operations report through

mod blackboard;
mod error;
mod fact;
mod types;

pub use blackboard::Blackboard;
pub use error::ActionError;
pub use fact::Fact;
pub use types::{AgentId, ExecutionState};
