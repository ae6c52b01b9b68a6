//! Action library: where templates live between registration and removal

use std::collections::BTreeMap;

use goapkit_core::{ActionError, Blackboard};
use tracing::debug;

use crate::template::{ActionTemplate, SharedTemplate};

/// Registered action templates, keyed by name.
///
/// Templates are handed out as `Arc`s, so deregistering one never pulls it
/// out from under a runtime instance that is still executing it.
pub struct ActionLibrary<C = Blackboard> {
    templates: BTreeMap<String, SharedTemplate<C>>,
}

impl<C: 'static> ActionLibrary<C> {
    pub fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Register a template, replacing any previous one with the same name.
    pub fn register(&mut self, template: ActionTemplate<C>) -> SharedTemplate<C> {
        let shared = template.shared();
        if self
            .templates
            .insert(shared.name().to_string(), shared.clone())
            .is_some()
        {
            debug!(action = %shared.name(), "replaced registered action template");
        } else {
            debug!(action = %shared.name(), "registered action template");
        }
        shared
    }

    /// Remove a template. Instances already holding it keep it alive.
    pub fn deregister(&mut self, name: &str) -> Option<SharedTemplate<C>> {
        let removed = self.templates.remove(name);
        if removed.is_some() {
            debug!(action = %name, "deregistered action template");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<SharedTemplate<C>> {
        self.templates.get(name).cloned()
    }

    /// Every template whose preconditions hold for `ctx`, ordered by name.
    ///
    /// This is the expansion step a planner runs per search node.
    pub fn applicable(&self, ctx: &C) -> Result<Vec<SharedTemplate<C>>, ActionError> {
        let mut found = Vec::new();
        for template in self.templates.values() {
            if template.valid(ctx)? {
                found.push(template.clone());
            }
        }
        Ok(found)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedTemplate<C>> {
        self.templates.values()
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<C: 'static> Default for ActionLibrary<C> {
    fn default() -> Self {
        Self::new()
    }
}
