//! Task state transitions.

use std::cell::Cell;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    struct Flags: u8 {
        /// The task is queued and waiting to execute.
        const SCHEDULED = 1<<0;
        /// The task payload is currently executing.
        const RUNNING   = 1<<1;
        /// The task payload finished, successfully or not.
        const COMPLETE  = 1<<2;
        /// The task was cancelled before its payload started.
        const CANCELLED = 1<<3;
        /// The task payload panicked.
        const FAILED    = 1<<4;
    }
}

/// [`StateCell`] is a cell that tracks the lifecycle of a task.
///
/// Transitions are one way: a scheduled task is either cancelled while
/// still queued, or runs exactly once to completion or failure. The
/// transition methods assert the flag combinations they rely on.
pub(crate) struct StateCell {
    state: Cell<Flags>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        Self {
            state: Cell::new(Flags::SCHEDULED),
        }
    }

    /// Prepare the task for execution.
    ///
    /// Consumes the scheduled flag and sets [`RUNNING`], unless the task
    /// was cancelled while queued, in which case its slot is a tombstone
    /// and the payload must not be invoked.
    #[inline]
    pub(crate) fn begin_run(&self) -> BeginRunResult {
        let mut state = self.state.get();
        assert!(state.contains(Flags::SCHEDULED));
        assert!(!state.contains(Flags::RUNNING));
        assert!(!state.contains(Flags::COMPLETE));

        if state.contains(Flags::CANCELLED) {
            return BeginRunResult::Skip;
        }
        state.remove(Flags::SCHEDULED);
        state.insert(Flags::RUNNING);
        self.state.set(state);
        BeginRunResult::Run
    }

    /// Conclude execution after the payload returned normally.
    #[inline]
    pub(crate) fn finish_run(&self) {
        let mut state = self.state.get();
        assert!(state.contains(Flags::RUNNING));
        state.remove(Flags::RUNNING);
        state.insert(Flags::COMPLETE);
        self.state.set(state);
    }

    /// Conclude execution after the payload panicked.
    #[inline]
    pub(crate) fn fail(&self) {
        let mut state = self.state.get();
        assert!(state.contains(Flags::RUNNING));
        state.remove(Flags::RUNNING);
        state.insert(Flags::COMPLETE | Flags::FAILED);
        self.state.set(state);
    }

    /// Request cancellation.
    ///
    /// Succeeds only while the payload has not started executing. The
    /// cancelled flag is never unset, and repeat cancellations of a
    /// still-queued task keep succeeding.
    #[inline]
    pub(crate) fn cancel(&self) -> CancelResult {
        let mut state = self.state.get();
        if state.intersects(Flags::RUNNING | Flags::COMPLETE) {
            return CancelResult::TooLate;
        }
        state.insert(Flags::CANCELLED);
        self.state.set(state);
        CancelResult::Cancelled
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.get().contains(Flags::CANCELLED)
    }

    #[inline]
    pub(crate) fn is_complete(&self) -> bool {
        self.state.get().contains(Flags::COMPLETE)
    }
}

#[must_use = "this `BeginRunResult` must be handled"]
#[derive(Debug, Copy, Clone)]
pub(crate) enum BeginRunResult {
    Run,
    Skip,
}

#[must_use = "this `CancelResult` must be handled"]
#[derive(Debug, Copy, Clone)]
pub(crate) enum CancelResult {
    Cancelled,
    TooLate,
}
