//! Runtime instances and the execution state machine they drive

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use goapkit_core::{ActionError, AgentId, ExecutionState};
use tracing::{debug, info};

use super::behavior::{Behavior, Progress};
use super::caller::Caller;
use crate::template::{RunnerKind, SharedTemplate};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle operations shared by every runtime variant.
///
/// Driven by the agent's update loop: `start` once, `update` any number of
/// times per tick, `finish` when the loop decides the action is over.
pub trait RuntimeAction: Send {
    fn id(&self) -> InstanceId;

    /// Agent this instance acts for
    fn caller_id(&self) -> AgentId;

    /// Name of the template being executed
    fn name(&self) -> &str;

    fn state(&self) -> ExecutionState;

    /// Begin execution. Only valid from `NotStarted`.
    fn start(&mut self) -> Result<ExecutionState, ActionError>;

    /// Advance the action. A no-op unless running.
    fn update(&mut self, delta: f32) -> Result<ExecutionState, ActionError>;

    /// Mark the action finished. Calling it again changes nothing.
    ///
    /// Called-once actions ignore this: they finish by starting, and one that
    /// was never started stays `NotStarted`.
    fn finish(&mut self);

    /// The template's preconditions, checked against the caller's context
    fn valid(&self) -> Result<bool, ActionError>;

    /// Apply the template's effects to the caller's context
    fn touch(&self) -> Result<(), ActionError>;

    fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Pause/resume access, for variants that support it
    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        None
    }
}

/// Variants that can be suspended and resumed
pub trait Pausable: RuntimeAction {
    /// `Running -> Paused`
    fn pause(&mut self) -> Result<(), ActionError>;

    /// `Paused -> Running`
    fn resume(&mut self) -> Result<(), ActionError>;
}

/// State and references every variant carries
struct InstanceCore<A: Caller> {
    id: InstanceId,
    caller: Weak<A>,
    caller_id: AgentId,
    caller_name: String,
    template: SharedTemplate<A::Context>,
    state: ExecutionState,
}

impl<A: Caller> InstanceCore<A> {
    fn new(caller: &Arc<A>, template: SharedTemplate<A::Context>) -> Self {
        Self {
            id: InstanceId::next(),
            caller: Arc::downgrade(caller),
            caller_id: caller.id(),
            caller_name: caller.name().to_string(),
            template,
            state: ExecutionState::NotStarted,
        }
    }

    fn caller(&self) -> Result<Arc<A>, ActionError> {
        self.caller.upgrade().ok_or_else(|| ActionError::CallerGone {
            action: self.template.name().to_string(),
        })
    }

    fn require_state(&self, state: ExecutionState, event: &'static str) -> Result<(), ActionError> {
        if self.state == state {
            Ok(())
        } else {
            Err(ActionError::InvalidTransition {
                action: self.template.name().to_string(),
                from: self.state,
                event,
            })
        }
    }

    fn valid(&self) -> Result<bool, ActionError> {
        let caller = self.caller()?;
        let ctx = caller.context().read();
        self.template.valid(&ctx)
    }

    fn touch(&self) -> Result<(), ActionError> {
        let caller = self.caller()?;
        let mut ctx = caller.context().write();
        self.template.touch(&mut ctx)
    }

    fn finish(&mut self) {
        if self.state != ExecutionState::Finished {
            debug!(instance = %self.id, action = %self.template.name(), from = %self.state, "finished");
            self.state = ExecutionState::Finished;
        }
    }

    fn log_start(&self, message: &'static str, variant: &'static str) {
        info!(
            instance = %self.id,
            variant,
            action = %self.template.name(),
            caller = %self.caller_name,
            caller_id = %self.caller_id,
            "{message}"
        );
    }
}

/// Runs across several updates until its [`Behavior`] reports `Done`
pub struct LongRunningAction<A: Caller, B> {
    core: InstanceCore<A>,
    behavior: B,
    variant: &'static str,
}

impl<A, B> LongRunningAction<A, B>
where
    A: Caller,
    B: Behavior<A::Context>,
{
    pub fn new(caller: &Arc<A>, template: SharedTemplate<A::Context>, behavior: B) -> Self {
        Self::with_variant(caller, template, behavior, "LongRunningAction")
    }

    fn with_variant(
        caller: &Arc<A>,
        template: SharedTemplate<A::Context>,
        behavior: B,
        variant: &'static str,
    ) -> Self {
        Self {
            core: InstanceCore::new(caller, template),
            behavior,
            variant,
        }
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }
}

impl<A, B> RuntimeAction for LongRunningAction<A, B>
where
    A: Caller,
    B: Behavior<A::Context>,
{
    fn id(&self) -> InstanceId {
        self.core.id
    }

    fn caller_id(&self) -> AgentId {
        self.core.caller_id
    }

    fn name(&self) -> &str {
        self.core.template.name()
    }

    fn state(&self) -> ExecutionState {
        self.core.state
    }

    fn start(&mut self) -> Result<ExecutionState, ActionError> {
        self.core.require_state(ExecutionState::NotStarted, "start")?;
        let caller = self.core.caller()?;
        {
            let ctx = caller.context().read();
            self.behavior.on_start(&ctx)?;
        }
        self.core.state = ExecutionState::Running;
        self.core.log_start("starting", self.variant);
        Ok(self.core.state)
    }

    fn update(&mut self, delta: f32) -> Result<ExecutionState, ActionError> {
        if self.core.state != ExecutionState::Running {
            return Ok(self.core.state);
        }
        let caller = self.core.caller()?;
        let progress = {
            let ctx = caller.context().read();
            self.behavior.tick(&ctx, delta)?
        };
        if progress == Progress::Done {
            self.core.finish();
        }
        Ok(self.core.state)
    }

    fn finish(&mut self) {
        self.core.finish();
    }

    fn valid(&self) -> Result<bool, ActionError> {
        self.core.valid()
    }

    fn touch(&self) -> Result<(), ActionError> {
        self.core.touch()
    }
}

/// Finished the instant it starts: an instantaneous change to the world
pub struct CalledOnceAction<A: Caller> {
    core: InstanceCore<A>,
}

impl<A: Caller> CalledOnceAction<A> {
    pub fn new(caller: &Arc<A>, template: SharedTemplate<A::Context>) -> Self {
        Self {
            core: InstanceCore::new(caller, template),
        }
    }
}

impl<A: Caller> RuntimeAction for CalledOnceAction<A> {
    fn id(&self) -> InstanceId {
        self.core.id
    }

    fn caller_id(&self) -> AgentId {
        self.core.caller_id
    }

    fn name(&self) -> &str {
        self.core.template.name()
    }

    fn state(&self) -> ExecutionState {
        self.core.state
    }

    fn start(&mut self) -> Result<ExecutionState, ActionError> {
        self.core.require_state(ExecutionState::NotStarted, "start")?;
        self.core.state = ExecutionState::Finished;
        self.core.log_start("doing", "CalledOnceAction");
        Ok(self.core.state)
    }

    fn update(&mut self, _delta: f32) -> Result<ExecutionState, ActionError> {
        Ok(self.core.state)
    }

    fn finish(&mut self) {}

    fn valid(&self) -> Result<bool, ActionError> {
        self.core.valid()
    }

    fn touch(&self) -> Result<(), ActionError> {
        self.core.touch()
    }
}

/// A long-running action that can be paused. While paused its behaviour is
/// not ticked.
pub struct PausableAction<A: Caller, B> {
    inner: LongRunningAction<A, B>,
}

impl<A, B> PausableAction<A, B>
where
    A: Caller,
    B: Behavior<A::Context>,
{
    pub fn new(caller: &Arc<A>, template: SharedTemplate<A::Context>, behavior: B) -> Self {
        Self {
            inner: LongRunningAction::with_variant(caller, template, behavior, "PausableAction"),
        }
    }

    pub fn behavior(&self) -> &B {
        self.inner.behavior()
    }
}

impl<A, B> RuntimeAction for PausableAction<A, B>
where
    A: Caller,
    B: Behavior<A::Context>,
{
    fn id(&self) -> InstanceId {
        self.inner.id()
    }

    fn caller_id(&self) -> AgentId {
        self.inner.caller_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn state(&self) -> ExecutionState {
        self.inner.state()
    }

    fn start(&mut self) -> Result<ExecutionState, ActionError> {
        self.inner.start()
    }

    fn update(&mut self, delta: f32) -> Result<ExecutionState, ActionError> {
        self.inner.update(delta)
    }

    fn finish(&mut self) {
        self.inner.finish();
    }

    fn valid(&self) -> Result<bool, ActionError> {
        self.inner.valid()
    }

    fn touch(&self) -> Result<(), ActionError> {
        self.inner.touch()
    }

    fn as_pausable(&mut self) -> Option<&mut dyn Pausable> {
        Some(self)
    }
}

impl<A, B> Pausable for PausableAction<A, B>
where
    A: Caller,
    B: Behavior<A::Context>,
{
    fn pause(&mut self) -> Result<(), ActionError> {
        let core = &mut self.inner.core;
        core.require_state(ExecutionState::Running, "pause")?;
        core.state = ExecutionState::Paused;
        debug!(instance = %core.id, action = %core.template.name(), "paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ActionError> {
        let core = &mut self.inner.core;
        core.require_state(ExecutionState::Paused, "resume")?;
        core.state = ExecutionState::Running;
        debug!(instance = %core.id, action = %core.template.name(), "resumed");
        Ok(())
    }
}

/// Create a runtime instance of the variant the template asks for.
///
/// `behavior` decides completion for long-running and pausable templates;
/// called-once templates ignore it.
pub fn instantiate<A, B>(
    caller: &Arc<A>,
    template: &SharedTemplate<A::Context>,
    behavior: B,
) -> Box<dyn RuntimeAction>
where
    A: Caller + 'static,
    B: Behavior<A::Context> + 'static,
{
    match template.runner() {
        RunnerKind::LongRunning => Box::new(LongRunningAction::new(caller, template.clone(), behavior)),
        RunnerKind::CalledOnce => Box::new(CalledOnceAction::new(caller, template.clone())),
        RunnerKind::Pausable => Box::new(PausableAction::new(caller, template.clone(), behavior)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::FactIs;
    use crate::effect::SetFact;
    use crate::runtime::behavior::{tick_fn, Immediate, Ticks, Timed};
    use crate::runtime::caller::Agent;
    use crate::template::ActionTemplate;
    use goapkit_core::Blackboard;
    use std::io;
    use std::sync::Mutex;

    /// Shared buffer the fmt subscriber writes log lines into
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Run `f` with a subscriber capturing info-level output
    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    fn open_door(runner: RunnerKind) -> SharedTemplate {
        ActionTemplate::builder("OpenDoor")
            .precondition(FactIs::new("door_closed", true))
            .precondition(FactIs::new("has_key", true))
            .effect(SetFact::new("door_closed", false))
            .runner(runner)
            .build()
            .shared()
    }

    fn door_agent() -> Arc<Agent> {
        let mut bb = Blackboard::new();
        bb.set_bool("door_closed", true);
        bb.set_bool("has_key", true);
        Agent::shared("gatekeeper", bb)
    }

    fn never_done() -> impl Behavior<Blackboard> {
        tick_fn(|_: &Blackboard, _dt: f32| Ok(Progress::Working))
    }

    #[test]
    fn test_long_running_lifecycle() {
        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), never_done());

        assert_eq!(action.state(), ExecutionState::NotStarted);
        assert_eq!(action.start().unwrap(), ExecutionState::Running);
        for _ in 0..10 {
            assert_eq!(action.update(0.5).unwrap(), ExecutionState::Running);
        }
        action.finish();
        assert_eq!(action.state(), ExecutionState::Finished);
        action.finish();
        assert_eq!(action.state(), ExecutionState::Finished);
        assert_eq!(action.update(0.5).unwrap(), ExecutionState::Finished);
    }

    #[test]
    fn test_long_running_finishes_when_behavior_done() {
        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Ticks::new(3));
        action.start().unwrap();
        assert_eq!(action.update(0.1).unwrap(), ExecutionState::Running);
        assert_eq!(action.update(0.1).unwrap(), ExecutionState::Running);
        assert_eq!(action.update(0.1).unwrap(), ExecutionState::Finished);
        assert!(action.is_finished());
    }

    #[test]
    fn test_update_before_start_is_noop() {
        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Timed::new(1.0));
        assert_eq!(action.update(5.0).unwrap(), ExecutionState::NotStarted);
        assert_eq!(action.behavior().elapsed(), 0.0);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Immediate);
        action.start().unwrap();
        assert_eq!(
            action.start(),
            Err(ActionError::InvalidTransition {
                action: "OpenDoor".into(),
                from: ExecutionState::Running,
                event: "start",
            })
        );
    }

    #[test]
    fn test_on_start_error_keeps_not_started() {
        struct Refuses;
        impl Behavior<Blackboard> for Refuses {
            fn on_start(&mut self, ctx: &Blackboard) -> Result<(), ActionError> {
                ctx.require_bool("path_known").map(|_| ())
            }
            fn tick(&mut self, _ctx: &Blackboard, _delta: f32) -> Result<Progress, ActionError> {
                Ok(Progress::Done)
            }
        }

        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Refuses);
        assert_eq!(
            action.start(),
            Err(ActionError::MissingFact("path_known".into()))
        );
        assert_eq!(action.state(), ExecutionState::NotStarted);
    }

    #[test]
    fn test_start_logs_instance_and_caller() {
        let agent = door_agent();
        let mut action =
            LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), never_done());
        let instance = action.id();

        let logs = capture_logs(|| {
            action.start().unwrap();
        });
        assert!(logs.contains("starting"), "{logs}");
        assert!(logs.contains("LongRunningAction"), "{logs}");
        assert!(logs.contains("OpenDoor"), "{logs}");
        assert!(logs.contains(&instance.to_string()), "{logs}");
        assert!(logs.contains("gatekeeper"), "{logs}");
        assert!(logs.contains(&agent.id().to_string()), "{logs}");
    }

    #[test]
    fn test_called_once_start_logs_doing() {
        let agent = door_agent();
        let mut action = CalledOnceAction::new(&agent, open_door(RunnerKind::CalledOnce));

        let logs = capture_logs(|| {
            action.start().unwrap();
        });
        assert!(logs.contains("doing"), "{logs}");
        assert!(logs.contains("CalledOnceAction"), "{logs}");
        assert!(logs.contains("gatekeeper"), "{logs}");
        assert!(logs.contains(&agent.id().to_string()), "{logs}");
        assert!(!logs.contains("starting"), "{logs}");
    }

    #[test]
    fn test_finish_before_start() {
        let agent = door_agent();
        let mut once = CalledOnceAction::new(&agent, open_door(RunnerKind::CalledOnce));
        once.finish();
        assert_eq!(once.state(), ExecutionState::NotStarted);

        let mut long = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Immediate);
        long.finish();
        assert_eq!(long.state(), ExecutionState::Finished);
    }

    #[test]
    fn test_called_once_finishes_on_start() {
        let agent = door_agent();
        let mut action = CalledOnceAction::new(&agent, open_door(RunnerKind::CalledOnce));
        assert_eq!(action.state(), ExecutionState::NotStarted);
        assert_eq!(action.start().unwrap(), ExecutionState::Finished);
        assert_eq!(action.update(1.0).unwrap(), ExecutionState::Finished);
        action.finish();
        assert_eq!(action.state(), ExecutionState::Finished);
        assert!(action.start().is_err());
    }

    #[test]
    fn test_pausable_halts_progress() {
        let agent = door_agent();
        let mut action = PausableAction::new(&agent, open_door(RunnerKind::Pausable), Timed::new(2.0));
        action.start().unwrap();
        action.update(0.5).unwrap();
        assert!((action.behavior().elapsed() - 0.5).abs() < 1e-6);

        action.pause().unwrap();
        assert_eq!(action.state(), ExecutionState::Paused);
        for _ in 0..20 {
            assert_eq!(action.update(0.5).unwrap(), ExecutionState::Paused);
        }
        assert!((action.behavior().elapsed() - 0.5).abs() < 1e-6);

        action.resume().unwrap();
        assert_eq!(action.update(0.5).unwrap(), ExecutionState::Running);
        assert_eq!(action.update(1.0).unwrap(), ExecutionState::Finished);
    }

    #[test]
    fn test_pause_requires_running() {
        let agent = door_agent();
        let mut action = PausableAction::new(&agent, open_door(RunnerKind::Pausable), never_done());
        assert!(matches!(
            action.pause(),
            Err(ActionError::InvalidTransition { from: ExecutionState::NotStarted, event: "pause", .. })
        ));
        action.start().unwrap();
        assert!(matches!(
            action.resume(),
            Err(ActionError::InvalidTransition { from: ExecutionState::Running, event: "resume", .. })
        ));
        action.pause().unwrap();
        action.finish();
        assert_eq!(action.state(), ExecutionState::Finished);
        assert!(action.pause().is_err());
    }

    #[test]
    fn test_valid_delegates_to_caller_context() {
        let agent = door_agent();
        let template = open_door(RunnerKind::CalledOnce);
        let action = CalledOnceAction::new(&agent, template.clone());

        for (closed, key) in [(true, true), (true, false), (false, true)] {
            {
                let mut bb = agent.blackboard_mut();
                bb.set_bool("door_closed", closed);
                bb.set_bool("has_key", key);
            }
            let direct = template.valid(&agent.blackboard()).unwrap();
            assert_eq!(action.valid().unwrap(), direct);
        }
    }

    #[test]
    fn test_touch_matches_direct_template_touch() {
        let template = open_door(RunnerKind::CalledOnce);
        let agent = door_agent();
        let action = CalledOnceAction::new(&agent, template.clone());

        let mut expected = agent.blackboard().clone();
        template.touch(&mut expected).unwrap();

        action.touch().unwrap();
        assert_eq!(*agent.blackboard(), expected);
    }

    #[test]
    fn test_open_door_through_instance() {
        let agent = door_agent();
        let mut action = CalledOnceAction::new(&agent, open_door(RunnerKind::CalledOnce));
        assert!(action.valid().unwrap());
        action.start().unwrap();
        action.touch().unwrap();
        assert_eq!(agent.blackboard().get_bool("door_closed"), Some(false));
        assert!(!action.valid().unwrap());
    }

    #[test]
    fn test_caller_dropped() {
        let agent = door_agent();
        let mut action = LongRunningAction::new(&agent, open_door(RunnerKind::LongRunning), Immediate);
        let caller_id = agent.id();
        drop(agent);

        assert_eq!(action.caller_id(), caller_id);
        let gone = ActionError::CallerGone {
            action: "OpenDoor".into(),
        };
        assert_eq!(action.valid(), Err(gone.clone()));
        assert_eq!(action.touch(), Err(gone.clone()));
        assert_eq!(action.start(), Err(gone));
    }

    #[test]
    fn test_instantiate_picks_variant() {
        let agent = door_agent();

        let mut once = instantiate(&agent, &open_door(RunnerKind::CalledOnce), Immediate);
        assert!(once.as_pausable().is_none());
        assert_eq!(once.start().unwrap(), ExecutionState::Finished);

        let mut long = instantiate(&agent, &open_door(RunnerKind::LongRunning), Ticks::new(2));
        assert!(long.as_pausable().is_none());
        assert_eq!(long.start().unwrap(), ExecutionState::Running);

        let mut pausable = instantiate(&agent, &open_door(RunnerKind::Pausable), Ticks::new(2));
        pausable.start().unwrap();
        pausable.as_pausable().unwrap().pause().unwrap();
        assert_eq!(pausable.state(), ExecutionState::Paused);
        assert_eq!(pausable.update(1.0).unwrap(), ExecutionState::Paused);
    }

    #[test]
    fn test_instances_share_template() {
        let template = open_door(RunnerKind::CalledOnce);
        let a = door_agent();
        let b = door_agent();
        let first = CalledOnceAction::new(&a, template.clone());
        let second = CalledOnceAction::new(&b, template.clone());

        assert_eq!(Arc::strong_count(&template), 3);
        assert_ne!(first.id(), second.id());
        first.touch().unwrap();
        assert!(!first.valid().unwrap());
        assert!(second.valid().unwrap());
        assert_eq!(first.name(), second.name());
    }
}
