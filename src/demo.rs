//! The door scenario: one agent, a short queue of actions, a fixed-step loop

use std::sync::Arc;

use goapkit_action::{
    instantiate, ActionLibrary, ActionTemplate, Agent, Caller, FactIs, RunnerKind, SetFact,
    SharedTemplate, Timed,
};
use goapkit_core::{ActionError, Blackboard};
use tracing::{info, warn};

use crate::settings::DemoSettings;

/// Names of the actions the demo agent works through, in order
pub const PLAN: [&str; 2] = ["unlock_door", "open_door"];

/// What happened to each queued action
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed { ticks: u32 },
    Skipped,
    TimedOut,
}

pub fn door_library() -> ActionLibrary {
    let mut library = ActionLibrary::new();
    library.register(
        ActionTemplate::builder("unlock_door")
            .precondition(FactIs::new("door_locked", true))
            .precondition(FactIs::new("has_key", true))
            .effect(SetFact::new("door_locked", false))
            .runner(RunnerKind::LongRunning)
            .cost(2.0)
            .build(),
    );
    library.register(
        ActionTemplate::builder("open_door")
            .precondition(FactIs::new("door_closed", true))
            .precondition(FactIs::new("has_key", true))
            .effect(SetFact::new("door_closed", false))
            .build(),
    );
    library
}

/// Drive one template to completion on the agent and apply its effects.
pub fn execute(
    agent: &Arc<Agent>,
    template: &SharedTemplate,
    settings: &DemoSettings,
) -> Result<Outcome, ActionError> {
    let mut action = instantiate(agent, template, Timed::new(settings.unlock_seconds));

    if !action.valid()? {
        warn!(action = %action.name(), agent = %agent.name(), "preconditions not met, skipping");
        return Ok(Outcome::Skipped);
    }

    action.start()?;
    let mut ticks = 0;
    while !action.is_finished() {
        if ticks >= settings.max_ticks {
            warn!(action = %action.name(), ticks, "action ran too long, abandoning");
            action.finish();
            return Ok(Outcome::TimedOut);
        }
        action.update(settings.tick_seconds)?;
        ticks += 1;
    }

    action.touch()?;
    info!(action = %action.name(), ticks, "completed");
    Ok(Outcome::Completed { ticks })
}

/// Run the whole plan and return the agent's final blackboard
pub fn run(settings: &DemoSettings) -> Result<(Blackboard, Vec<(String, Outcome)>), ActionError> {
    let library = door_library();
    let agent = Agent::shared("gatekeeper", settings.initial_facts.clone());
    info!(agent = %agent.name(), id = %agent.id(), "agent ready");

    let mut outcomes = Vec::new();
    for name in PLAN {
        let Some(template) = library.get(name) else {
            warn!(action = name, "not registered");
            continue;
        };
        let outcome = execute(&agent, &template, settings)?;
        outcomes.push((name.to_string(), outcome));
    }

    let blackboard = agent.blackboard().clone();
    Ok((blackboard, outcomes))
}
