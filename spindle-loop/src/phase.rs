use std::fmt;

/// The execution phase of an event loop.
///
/// Phases advance through a fixed cycle: the caller's synchronous block,
/// the priority and microtask drains, then the staged macrotask phases
/// (timers, poll, check) once per loop iteration. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// The loop has not started.
    Idle,
    /// The caller's synchronous block is executing.
    RunningSync,
    /// The priority queue is draining to exhaustion.
    DrainingPriority,
    /// The microtask queue is draining to exhaustion.
    DrainingMicrotask,
    /// Ready timers are firing.
    Timers,
    /// The poll (I/O completion) snapshot is executing.
    Poll,
    /// The check snapshot is executing.
    Check,
    /// Every queue has drained; the loop has shut down permanently.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::RunningSync => "sync",
            Phase::DrainingPriority => "drain-priority",
            Phase::DrainingMicrotask => "drain-microtask",
            Phase::Timers => "timers",
            Phase::Poll => "poll",
            Phase::Check => "check",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}
