use crate::types::ExecutionState;

/// Errors raised while evaluating or executing actions.
///
/// Nothing in goapkit retries or swallows these; they surface unchanged to
/// the planner or update loop that made the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("fact '{0}' is not on the blackboard")]
    MissingFact(String),

    #[error("fact '{key}' is {found}, expected {expected}")]
    FactTypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("fact '{0}' would overflow")]
    FactOverflow(String),

    #[error("caller of action '{action}' no longer exists")]
    CallerGone { action: String },

    #[error("action '{action}' cannot {event} while {from}")]
    InvalidTransition {
        action: String,
        from: ExecutionState,
        event: &'static str,
    },

    #[error("{0}")]
    Collaborator(String),
}
