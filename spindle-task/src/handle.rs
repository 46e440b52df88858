use std::fmt;
use std::rc::Rc;

use crate::state::{CancelResult, StateCell};
use crate::task::TaskId;

/// Cancellation handle for a scheduled task.
///
/// Handles are cheap to clone and stay valid after the task has run;
/// cancelling a task that already executed simply reports failure.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Rc<StateCell>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, state: Rc<StateCell>) -> Self {
        Self { id, state }
    }

    /// The id of the task this handle refers to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancel the task.
    ///
    /// Returns `true` if the payload had not yet begun executing and is now
    /// guaranteed never to run. Returns `false` once the payload has
    /// started, completed, or failed. Cancellation is synchronous,
    /// idempotent, and never errors.
    pub fn cancel(&self) -> bool {
        match self.state.cancel() {
            CancelResult::Cancelled => true,
            CancelResult::TooLate => false,
        }
    }

    /// Returns true if the task ran to completion or failure.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}
