use std::sync::Arc;

use goapkit_core::{AgentId, Blackboard};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The agent a runtime action acts on behalf of.
///
/// Instances only ever borrow the caller's context for the length of one
/// call; they never own it.
pub trait Caller: Send + Sync {
    type Context: Send + Sync + 'static;

    fn id(&self) -> AgentId;

    /// Display name used in diagnostics
    fn name(&self) -> &str;

    fn context(&self) -> &RwLock<Self::Context>;
}

/// A minimal agent: an identity plus the blackboard it owns
pub struct Agent<C = Blackboard> {
    id: AgentId,
    name: String,
    blackboard: RwLock<C>,
}

impl<C> Agent<C> {
    pub fn new(name: impl Into<String>, blackboard: C) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            blackboard: RwLock::new(blackboard),
        }
    }

    /// Create an agent ready to be referenced by runtime actions
    pub fn shared(name: impl Into<String>, blackboard: C) -> Arc<Self> {
        Arc::new(Self::new(name, blackboard))
    }

    pub fn blackboard(&self) -> RwLockReadGuard<'_, C> {
        self.blackboard.read()
    }

    pub fn blackboard_mut(&self) -> RwLockWriteGuard<'_, C> {
        self.blackboard.write()
    }
}

impl<C: Send + Sync + 'static> Caller for Agent<C> {
    type Context = C;

    fn id(&self) -> AgentId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &RwLock<C> {
        &self.blackboard
    }
}
