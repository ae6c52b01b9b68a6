//! Effects: mutations applied to a context when an action succeeds

use goapkit_core::{ActionError, Blackboard, Fact};

/// A change an action makes to a context.
///
/// All mutation lands in the context; an effect holds no state of its own.
pub trait Effect<C: ?Sized>: Send + Sync {
    fn touch(&self, ctx: &mut C) -> Result<(), ActionError>;
}

/// Effect backed by a closure. Built with [`effect`].
pub struct FnEffect<F>(F);

/// Wrap a closure as an [`Effect`].
pub fn effect<C, F>(f: F) -> FnEffect<F>
where
    C: ?Sized,
    F: Fn(&mut C) -> Result<(), ActionError> + Send + Sync,
{
    FnEffect(f)
}

impl<C: ?Sized, F> Effect<C> for FnEffect<F>
where
    F: Fn(&mut C) -> Result<(), ActionError> + Send + Sync,
{
    fn touch(&self, ctx: &mut C) -> Result<(), ActionError> {
        (self.0)(ctx)
    }
}

/// Write a fact, replacing any previous value
#[derive(Debug, Clone)]
pub struct SetFact {
    key: String,
    value: Fact,
}

impl SetFact {
    pub fn new(key: impl Into<String>, value: impl Into<Fact>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Effect<Blackboard> for SetFact {
    fn touch(&self, ctx: &mut Blackboard) -> Result<(), ActionError> {
        ctx.set(&self.key, self.value.clone());
        Ok(())
    }
}

/// Remove a fact if present
#[derive(Debug, Clone)]
pub struct ClearFact(pub String);

impl Effect<Blackboard> for ClearFact {
    fn touch(&self, ctx: &mut Blackboard) -> Result<(), ActionError> {
        ctx.remove(&self.0);
        Ok(())
    }
}

/// Add to an existing float fact
#[derive(Debug, Clone)]
pub struct AddFloat {
    key: String,
    amount: f32,
}

impl AddFloat {
    pub fn new(key: impl Into<String>, amount: f32) -> Self {
        Self {
            key: key.into(),
            amount,
        }
    }
}

impl Effect<Blackboard> for AddFloat {
    fn touch(&self, ctx: &mut Blackboard) -> Result<(), ActionError> {
        let current = ctx.require_float(&self.key)?;
        ctx.set_float(&self.key, current + self.amount);
        Ok(())
    }
}

/// Add to an existing int fact
#[derive(Debug, Clone)]
pub struct AddInt {
    key: String,
    amount: i64,
}

impl AddInt {
    pub fn new(key: impl Into<String>, amount: i64) -> Self {
        Self {
            key: key.into(),
            amount,
        }
    }
}

impl Effect<Blackboard> for AddInt {
    fn touch(&self, ctx: &mut Blackboard) -> Result<(), ActionError> {
        let current = ctx.require_int(&self.key)?;
        let updated = current
            .checked_add(self.amount)
            .ok_or_else(|| ActionError::FactOverflow(self.key.clone()))?;
        ctx.set_int(&self.key, updated);
        Ok(())
    }
}
