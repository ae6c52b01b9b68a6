//! Preconditions: pure predicates gating whether an action may run

use goapkit_core::{ActionError, Blackboard, Fact};

/// Something that can be checked against a context.
///
/// Implementations must not retain any part of the context and must give the
/// same answer for the same observable context, since the planner evaluates
/// them many times against many hypothetical contexts, possibly from several
/// threads at once.
pub trait Precondition<C: ?Sized>: Send + Sync {
    fn valid(&self, ctx: &C) -> Result<bool, ActionError>;
}

/// Precondition backed by a closure. Built with [`condition`].
pub struct FnCondition<F>(F);

/// Wrap a closure as a [`Precondition`].
pub fn condition<C, F>(f: F) -> FnCondition<F>
where
    C: ?Sized,
    F: Fn(&C) -> Result<bool, ActionError> + Send + Sync,
{
    FnCondition(f)
}

impl<C: ?Sized, F> Precondition<C> for FnCondition<F>
where
    F: Fn(&C) -> Result<bool, ActionError> + Send + Sync,
{
    fn valid(&self, ctx: &C) -> Result<bool, ActionError> {
        (self.0)(ctx)
    }
}

/// Holds when the fact equals the given value. A missing fact is an error,
/// not `false`: the blackboard was expected to know.
#[derive(Debug, Clone)]
pub struct FactIs {
    key: String,
    value: Fact,
}

impl FactIs {
    pub fn new(key: impl Into<String>, value: impl Into<Fact>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Precondition<Blackboard> for FactIs {
    fn valid(&self, ctx: &Blackboard) -> Result<bool, ActionError> {
        let fact = ctx.require(&self.key)?;
        if fact.kind() != self.value.kind() {
            return Err(ActionError::FactTypeMismatch {
                key: self.key.clone(),
                expected: self.value.kind(),
                found: fact.kind(),
            });
        }
        Ok(*fact == self.value)
    }
}

/// Holds when the key is on the blackboard, whatever its value
#[derive(Debug, Clone)]
pub struct FactPresent(pub String);

impl Precondition<Blackboard> for FactPresent {
    fn valid(&self, ctx: &Blackboard) -> Result<bool, ActionError> {
        Ok(ctx.contains(&self.0))
    }
}

/// Holds when the key is not on the blackboard
#[derive(Debug, Clone)]
pub struct FactAbsent(pub String);

impl Precondition<Blackboard> for FactAbsent {
    fn valid(&self, ctx: &Blackboard) -> Result<bool, ActionError> {
        Ok(!ctx.contains(&self.0))
    }
}

/// Holds when a float fact is at least `min`
#[derive(Debug, Clone)]
pub struct FloatAtLeast {
    key: String,
    min: f32,
}

impl FloatAtLeast {
    pub fn new(key: impl Into<String>, min: f32) -> Self {
        Self {
            key: key.into(),
            min,
        }
    }
}

impl Precondition<Blackboard> for FloatAtLeast {
    fn valid(&self, ctx: &Blackboard) -> Result<bool, ActionError> {
        Ok(ctx.require_float(&self.key)? >= self.min)
    }
}

/// Negates another precondition. Errors pass through unchanged.
#[derive(Debug, Clone)]
pub struct Not<P>(pub P);

impl<C: ?Sized, P: Precondition<C>> Precondition<C> for Not<P> {
    fn valid(&self, ctx: &C) -> Result<bool, ActionError> {
        self.0.valid(ctx).map(|ok| !ok)
    }
}
