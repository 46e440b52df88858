use std::any::Any;
use std::fmt;
use std::panic;
use std::rc::Rc;

use crate::handle::TaskHandle;
use crate::state::{BeginRunResult, StateCell};

/// Identifier for a scheduled task.
///
/// Ids are allocated from a monotonic per-loop counter, so an id doubles as
/// the global scheduling sequence: comparing the ids of two tasks from the
/// same loop compares their scheduling order. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Construct a [`TaskId`] from a raw sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence)
    }

    /// The scheduling sequence number backing this id.
    ///
    /// This is the universal tie-break: lower sequences were scheduled
    /// earlier, across every task kind combined.
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The queue a task was scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Highest-precedence queue, drained to exhaustion before microtasks.
    Priority,
    /// Drained to exhaustion between macrotasks.
    Microtask,
    /// Fires once its logical deadline is reached.
    Timer,
    /// I/O-completion phase callback.
    Poll,
    /// Check ("immediate") phase callback.
    Check,
}

/// A single schedulable unit of work.
///
/// A [`Task`] pairs a capability-erased payload with its identity and
/// lifecycle state. The payload is invoked uniformly regardless of kind,
/// at most once, via [`Task::run`].
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    payload: Box<dyn FnOnce()>,
    state: Rc<StateCell>,
}

impl Task {
    /// Create a task and the [`TaskHandle`] used to cancel it.
    pub fn new<F>(id: TaskId, kind: TaskKind, payload: F) -> (Self, TaskHandle)
    where
        F: FnOnce() + 'static,
    {
        let state = Rc::new(StateCell::new());
        let handle = TaskHandle::new(id, Rc::clone(&state));
        let task = Self {
            id,
            kind,
            payload: Box::new(payload),
            state,
        };
        (task, handle)
    }

    /// The task's identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The queue this task was scheduled on.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns true if the task was cancelled while queued.
    ///
    /// Cancelled tasks keep their queue slot as a tombstone; [`Task::run`]
    /// skips them without invoking the payload.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Execute the payload.
    ///
    /// This is the per-task isolation boundary: a cancelled task is skipped
    /// without invoking its payload, and a panicking payload is caught and
    /// returned as [`RunOutcome::Failed`] rather than unwinding into the
    /// loop driver.
    pub fn run(self) -> RunOutcome {
        match self.state.begin_run() {
            BeginRunResult::Skip => return RunOutcome::Skipped,
            BeginRunResult::Run => {}
        }
        let Task { payload, state, .. } = self;
        match panic::catch_unwind(panic::AssertUnwindSafe(payload)) {
            Ok(()) => {
                state.finish_run();
                RunOutcome::Completed
            }
            Err(panic) => {
                state.fail();
                RunOutcome::Failed(TaskError::panic(panic))
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The result of running a task.
#[must_use = "this `RunOutcome` may be a `Failed` variant, which should be reported"]
#[derive(Debug)]
pub enum RunOutcome {
    /// The payload ran to completion.
    Completed,
    /// The task was cancelled; the payload was not invoked.
    Skipped,
    /// The payload panicked.
    Failed(TaskError),
}

/// [`TaskError`] indicates a failure in a task.
///
/// The only failure a payload can produce is a panic; the panic value is
/// captured so a failure sink can report it without the loop unwinding.
pub struct TaskError {
    panic: Box<dyn Any + Send + 'static>,
}

impl TaskError {
    pub(crate) fn panic(panic: Box<dyn Any + Send + 'static>) -> Self {
        Self { panic }
    }

    /// Best-effort extraction of the panic message.
    pub fn message(&self) -> &str {
        if let Some(message) = self.panic.downcast_ref::<&'static str>() {
            message
        } else if let Some(message) = self.panic.downcast_ref::<String>() {
            message
        } else {
            "task panicked"
        }
    }
}

impl std::error::Error for TaskError {}

impl fmt::Debug for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskError::Panic({:?})", self.message())
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task panicked: {}", self.message())
    }
}
