/// Error returned when a task cannot be scheduled.
///
/// Scheduling rejections never panic and never create a task.
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error(transparent)]
pub struct ScheduleError {
    kind: ScheduleErrorKind,
}

impl ScheduleError {
    pub(crate) fn closed() -> Self {
        Self {
            kind: ScheduleErrorKind::Closed,
        }
    }

    /// Returns true if scheduling failed because the loop already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, ScheduleErrorKind::Closed)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy)]
enum ScheduleErrorKind {
    #[error("the event loop has closed")]
    Closed,
    #[error(transparent)]
    Deadline(spindle_timer::Error),
}

impl From<spindle_timer::Error> for ScheduleError {
    fn from(err: spindle_timer::Error) -> Self {
        Self {
            kind: ScheduleErrorKind::Deadline(err),
        }
    }
}
