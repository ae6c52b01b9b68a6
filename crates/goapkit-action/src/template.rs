//! Planning templates: the shared, stateless description of an action type

use std::fmt;
use std::sync::Arc;

use goapkit_core::{ActionError, Blackboard};

use crate::condition::Precondition;
use crate::effect::Effect;

/// A template shared between the planner and every runtime instance using it
pub type SharedTemplate<C = Blackboard> = Arc<ActionTemplate<C>>;

/// Which runtime variant a template is executed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunnerKind {
    /// Runs across several updates until its behaviour reports completion
    LongRunning,
    /// Done the moment it starts
    #[default]
    CalledOnce,
    /// Long-running, and can be paused and resumed
    Pausable,
}

/// Something an agent can do: preconditions that gate it and effects it has
/// on the world once it succeeds.
///
/// A template is immutable once built. It exists once per action type and is
/// evaluated by the planner against many hypothetical contexts, so `valid`
/// and `touch` only ever read or write the context they are handed.
pub struct ActionTemplate<C = Blackboard> {
    name: String,
    preconditions: Vec<Box<dyn Precondition<C>>>,
    effects: Vec<Box<dyn Effect<C>>>,
    cost: f32,
    runner: RunnerKind,
}

impl<C: 'static> ActionTemplate<C> {
    /// Build a template from ordered precondition and effect sequences
    pub fn new(
        name: impl Into<String>,
        preconditions: Vec<Box<dyn Precondition<C>>>,
        effects: Vec<Box<dyn Effect<C>>>,
    ) -> Self {
        Self::builder(name)
            .preconditions(preconditions)
            .effects(effects)
            .build()
    }

    /// Build a template with exactly one precondition and one effect
    pub fn single(
        name: impl Into<String>,
        precondition: impl Precondition<C> + 'static,
        effect: impl Effect<C> + 'static,
    ) -> Self {
        Self::builder(name)
            .precondition(precondition)
            .effect(effect)
            .build()
    }

    pub fn builder(name: impl Into<String>) -> ActionTemplateBuilder<C> {
        ActionTemplateBuilder {
            name: name.into(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            cost: 1.0,
            runner: RunnerKind::default(),
        }
    }

    /// Given the context, can this action run?
    ///
    /// True iff every precondition holds; stops at the first that doesn't.
    /// No preconditions means always valid.
    pub fn valid(&self, ctx: &C) -> Result<bool, ActionError> {
        for precondition in &self.preconditions {
            if !precondition.valid(ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Apply every effect to the context in declaration order.
    ///
    /// Stops at the first failing effect; the ones before it stay applied.
    pub fn touch(&self, ctx: &mut C) -> Result<(), ActionError> {
        for effect in &self.effects {
            effect.touch(ctx)?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Planner-facing weight of taking this action
    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn runner(&self) -> RunnerKind {
        self.runner
    }

    pub fn precondition_count(&self) -> usize {
        self.preconditions.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Wrap in an `Arc` for sharing
    pub fn shared(self) -> SharedTemplate<C> {
        Arc::new(self)
    }
}

impl<C> fmt::Display for ActionTemplate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Action=\"{}\">", self.name)
    }
}

impl<C> fmt::Debug for ActionTemplate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTemplate")
            .field("name", &self.name)
            .field("preconditions", &self.preconditions.len())
            .field("effects", &self.effects.len())
            .field("cost", &self.cost)
            .field("runner", &self.runner)
            .finish()
    }
}

/// Collects the parts of an [`ActionTemplate`] before it is frozen
pub struct ActionTemplateBuilder<C = Blackboard> {
    name: String,
    preconditions: Vec<Box<dyn Precondition<C>>>,
    effects: Vec<Box<dyn Effect<C>>>,
    cost: f32,
    runner: RunnerKind,
}

impl<C: 'static> ActionTemplateBuilder<C> {
    pub fn precondition(mut self, precondition: impl Precondition<C> + 'static) -> Self {
        self.preconditions.push(Box::new(precondition));
        self
    }

    pub fn preconditions(
        mut self,
        preconditions: impl IntoIterator<Item = Box<dyn Precondition<C>>>,
    ) -> Self {
        self.preconditions.extend(preconditions);
        self
    }

    pub fn effect(mut self, effect: impl Effect<C> + 'static) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    pub fn effects(mut self, effects: impl IntoIterator<Item = Box<dyn Effect<C>>>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn cost(mut self, cost: f32) -> Self {
        self.cost = cost;
        self
    }

    pub fn runner(mut self, runner: RunnerKind) -> Self {
        self.runner = runner;
        self
    }

    pub fn build(self) -> ActionTemplate<C> {
        ActionTemplate {
            name: self.name,
            preconditions: self.preconditions,
            effects: self.effects,
            cost: self.cost,
            runner: self.runner,
        }
    }
}
