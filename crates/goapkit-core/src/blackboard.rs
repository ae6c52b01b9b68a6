//! Blackboard: the mutable fact store an agent's actions read and write

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::fact::Fact;

/// Named facts describing what one agent knows about the world.
///
/// Cloning is how a planner explores hypothetical futures: templates are
/// evaluated against the clone, the agent's own blackboard stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blackboard {
    facts: HashMap<String, Fact>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self {
            facts: HashMap::new(),
        }
    }

    /// Create a blackboard holding a single bool fact
    pub fn from_bool(key: &str, val: bool) -> Self {
        let mut bb = Self::new();
        bb.set_bool(key, val);
        bb
    }

    pub fn set(&mut self, key: &str, fact: impl Into<Fact>) {
        self.facts.insert(key.to_string(), fact.into());
    }

    pub fn get(&self, key: &str) -> Option<&Fact> {
        self.facts.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Fact> {
        self.facts.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn set_bool(&mut self, key: &str, val: bool) {
        self.set(key, Fact::Bool(val));
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Fact::as_bool)
    }

    pub fn set_int(&mut self, key: &str, val: i64) {
        self.set(key, Fact::Int(val));
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Fact::as_int)
    }

    pub fn set_float(&mut self, key: &str, val: f32) {
        self.set(key, Fact::Float(val));
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(Fact::as_float)
    }

    pub fn set_text(&mut self, key: &str, val: impl Into<String>) {
        self.set(key, Fact::Text(val.into()));
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Fact::as_text)
    }

    /// Fetch a fact that must be present.
    pub fn require(&self, key: &str) -> Result<&Fact, ActionError> {
        self.get(key)
            .ok_or_else(|| ActionError::MissingFact(key.to_string()))
    }

    pub fn require_bool(&self, key: &str) -> Result<bool, ActionError> {
        let fact = self.require(key)?;
        fact.as_bool().ok_or_else(|| mismatch(key, "bool", fact))
    }

    pub fn require_int(&self, key: &str) -> Result<i64, ActionError> {
        let fact = self.require(key)?;
        fact.as_int().ok_or_else(|| mismatch(key, "int", fact))
    }

    pub fn require_float(&self, key: &str) -> Result<f32, ActionError> {
        let fact = self.require(key)?;
        fact.as_float().ok_or_else(|| mismatch(key, "float", fact))
    }

    /// Check if every fact in `required` holds here.
    /// Missing facts are treated as not satisfied.
    pub fn satisfies(&self, required: &Blackboard) -> bool {
        required
            .facts
            .iter()
            .all(|(key, val)| self.facts.get(key) == Some(val))
    }

    /// Merge all facts from `other` into this blackboard, overwriting on conflict
    pub fn apply(&mut self, other: &Blackboard) {
        for (key, val) in &other.facts {
            self.facts.insert(key.clone(), val.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fact)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of facts
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

fn mismatch(key: &str, expected: &'static str, found: &Fact) -> ActionError {
    ActionError::FactTypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
