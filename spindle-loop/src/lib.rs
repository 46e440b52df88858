//! Provides a deterministic, single-threaded cooperative task scheduler.
//!
//! [`EventLoop`] reproduces the execution-ordering contract of an
//! event-driven runtime: a synchronous startup block, a high-priority
//! callback queue, a microtask queue drained to exhaustion, and staged
//! macrotask phases (timers, poll, check) visited in a fixed order per
//! iteration.
//!
//! Scheduling goes through a [`Handle`], or through the free functions,
//! which resolve the handle from thread-local context while the loop is
//! running. [`EventLoop::run`] executes the full lifecycle and returns an
//! [`ExecutionLog`] of every payload that ran, in order.
//!
//! Time is logical: timer deadlines are abstract ticks with no wall-clock
//! binding, so a given scheduling sequence always replays the same log.
//!
//! ```rust
//! let event_loop = spindle_loop::EventLoop::new();
//! let log = event_loop.run(|handle| {
//!     handle.schedule_microtask(|| println!("second")).unwrap();
//!     println!("first");
//! });
//! assert_eq!(log.len(), 1);
//! ```
//!
//! # Modules
//! - [`sink`]: failure reporting for task payloads.
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spindle_task::{ReadyQueue, RunOutcome, Task};
use spindle_timer::{Clock, TimerHeap};

mod context;
mod error;
mod phase;
mod record;
/// Failure reporting for task payloads.
pub mod sink;

pub use error::ScheduleError;
pub use record::{ExecutionLog, LogEntry};
pub use spindle_task::{TaskError, TaskHandle, TaskId, TaskKind};

use phase::Phase;

const LOG: &str = "spindle_loop::driver";

/// A deterministic, single-threaded cooperative event loop.
///
/// The loop owns four FIFO queues (priority, microtask, poll, check) and a
/// timer heap, and is the only component that dequeues and executes tasks.
/// Exactly one payload executes at a time, and each runs to completion
/// without preemption.
///
/// [`EventLoop::run`] consumes the loop: once every queue has drained, the
/// loop closes permanently. Handles obtained before the run stay usable
/// for inspection but report [`ScheduleError`] on further scheduling.
pub struct EventLoop {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("phase", &self.shared.phase.get())
            .field("tick", &self.shared.clock.now())
            .finish()
    }
}

struct Shared {
    priority: ReadyQueue,
    microtasks: ReadyQueue,
    poll: ReadyQueue,
    check: ReadyQueue,
    timers: TimerHeap,
    clock: Clock,
    next_sequence: Cell<u64>,
    phase: Cell<Phase>,
    record: RefCell<ExecutionLog>,
    sink: Box<dyn sink::ErrorSink>,
    starvation_limit: Cell<Option<usize>>,
}

impl EventLoop {
    /// Construct an event loop reporting task failures through
    /// [`sink::LogSink`].
    pub fn new() -> Self {
        Self::with_error_sink(sink::LogSink)
    }

    /// Construct an event loop reporting task failures to `sink`.
    pub fn with_error_sink<S>(sink: S) -> Self
    where
        S: sink::ErrorSink + 'static,
    {
        let shared = Shared {
            priority: ReadyQueue::new(),
            microtasks: ReadyQueue::new(),
            poll: ReadyQueue::new(),
            check: ReadyQueue::new(),
            timers: TimerHeap::new(),
            clock: Clock::new(),
            next_sequence: Cell::new(0),
            phase: Cell::new(Phase::Idle),
            record: RefCell::new(ExecutionLog::default()),
            sink: Box::new(sink),
            starvation_limit: Cell::new(None),
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    /// Cap the number of tasks a single priority/microtask drain pass may
    /// execute.
    ///
    /// Recursive self-scheduling into the priority or microtask queue is
    /// allowed to monopolize the loop by design; the cap is a diagnostic
    /// for harnesses exercising that hazard. Default semantics (unbounded
    /// drains) are unchanged when no cap is set.
    ///
    /// ### Panics
    /// A drain pass that exceeds the cap panics during [`EventLoop::run`].
    pub fn with_starvation_limit(self, limit: usize) -> Self {
        self.shared.starvation_limit.set(Some(limit));
        self
    }

    /// Returns a [`Handle`] for scheduling onto this loop.
    pub fn handle(&self) -> Handle {
        Handle {
            shared: Rc::clone(&self.shared),
        }
    }

    /// The current logical tick.
    pub fn current_tick(&self) -> u64 {
        self.shared.clock.now()
    }

    /// Run the loop to completion.
    ///
    /// Executes `sync_block` first; scheduling calls made during the block
    /// enqueue tasks without executing them. The loop then drains the
    /// priority queue, then the microtask queue, and iterates the timers,
    /// poll, and check phases until every queue and the heap are empty,
    /// at which point it closes permanently.
    ///
    /// Returns the ordered log of executed tasks.
    ///
    /// ### Panics
    /// Panics if another loop is already running on this thread. Panics
    /// from `sync_block` propagate to the caller; panics from task
    /// payloads do not (they are routed to the error sink).
    pub fn run<F>(self, sync_block: F) -> ExecutionLog
    where
        F: FnOnce(&Handle),
    {
        let handle = self.handle();
        let _guard = context::Context::enter(self.handle());

        self.shared.transition(Phase::RunningSync);
        sync_block(&handle);

        self.shared.drain_ready();
        self.shared.run_phases();

        self.shared.transition(Phase::Closed);
        self.shared.record.take()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for scheduling tasks onto an [`EventLoop`].
///
/// Handles are cheap to clone and may be held by external collaborators
/// (an I/O simulator, a timer source). All scheduling goes through the
/// operations here; queue internals are never exposed.
#[derive(Clone)]
pub struct Handle {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").finish()
    }
}

impl Handle {
    /// Returns a handle to the currently running [`EventLoop`].
    ///
    /// ### Panics
    /// Panics if called outside of [`EventLoop::run`].
    pub fn current() -> Self {
        context::Context::handle().expect("no event loop running")
    }

    /// Schedule `payload` onto the priority queue.
    ///
    /// Priority tasks execute before any microtask; work scheduled here
    /// while the queue is draining still runs in the same drain pass.
    pub fn schedule_priority<F>(&self, payload: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + 'static,
    {
        self.shared.schedule_fifo(TaskKind::Priority, payload)
    }

    /// Schedule `payload` onto the microtask queue.
    ///
    /// Microtasks drain to exhaustion after the priority queue and after
    /// every macrotask callback; a microtask scheduled by a microtask runs
    /// within the same drain pass, before the next macrotask.
    pub fn schedule_microtask<F>(&self, payload: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + 'static,
    {
        self.shared.schedule_fifo(TaskKind::Microtask, payload)
    }

    /// Schedule `payload` to fire once `delay` logical ticks have elapsed.
    ///
    /// The deadline is fixed at schedule time as `current_tick() + delay`.
    /// Earlier deadlines fire first; equal deadlines fire in scheduling
    /// order. A delay of zero fires in the next timers phase.
    pub fn schedule_timer<F>(&self, payload: F, delay: u64) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + 'static,
    {
        self.shared.schedule_timer(delay, payload)
    }

    /// Schedule `payload` onto the poll queue.
    ///
    /// This is the entry point for I/O-completion collaborators. The poll
    /// phase executes a snapshot taken at phase entry, so tasks enqueued
    /// while the phase is executing are deferred to the next iteration.
    pub fn schedule_io<F>(&self, payload: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + 'static,
    {
        self.shared.schedule_fifo(TaskKind::Poll, payload)
    }

    /// Schedule `payload` onto the check queue.
    ///
    /// Check callbacks run after the poll phase of each iteration, under
    /// the same snapshot rule.
    pub fn schedule_check<F>(&self, payload: F) -> Result<TaskHandle, ScheduleError>
    where
        F: FnOnce() + 'static,
    {
        self.shared.schedule_fifo(TaskKind::Check, payload)
    }

    /// The current logical tick.
    pub fn current_tick(&self) -> u64 {
        self.shared.clock.now()
    }

    /// Returns true once the loop has drained every queue and shut down.
    pub fn is_closed(&self) -> bool {
        self.shared.phase.get() == Phase::Closed
    }
}

impl Shared {
    fn transition(&self, next: Phase) {
        let prev = self.phase.replace(next);
        if prev != next {
            log::trace!(target: LOG, "phase.enter {} (from {})", next, prev);
        }
    }

    fn check_open(&self) -> Result<(), ScheduleError> {
        if self.phase.get() == Phase::Closed {
            return Err(ScheduleError::closed());
        }
        Ok(())
    }

    fn create_task(
        &self,
        kind: TaskKind,
        payload: impl FnOnce() + 'static,
    ) -> (Task, TaskHandle) {
        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);
        let id = TaskId::from_sequence(sequence);
        log::trace!(target: LOG, "task.schedule id={} kind={:?}", id, kind);
        Task::new(id, kind, payload)
    }

    fn schedule_fifo(
        &self,
        kind: TaskKind,
        payload: impl FnOnce() + 'static,
    ) -> Result<TaskHandle, ScheduleError> {
        self.check_open()?;
        let (task, handle) = self.create_task(kind, payload);
        match kind {
            TaskKind::Priority => self.priority.push(task),
            TaskKind::Microtask => self.microtasks.push(task),
            TaskKind::Poll => self.poll.push(task),
            TaskKind::Check => self.check.push(task),
            TaskKind::Timer => unreachable!("timers are scheduled through the heap"),
        }
        Ok(handle)
    }

    fn schedule_timer(
        &self,
        delay: u64,
        payload: impl FnOnce() + 'static,
    ) -> Result<TaskHandle, ScheduleError> {
        self.check_open()?;
        let deadline = self.clock.deadline_after(delay)?;
        let (task, handle) = self.create_task(TaskKind::Timer, payload);
        log::trace!(target: LOG, "timer.register id={} deadline={}", task.id(), deadline);
        self.timers.push(deadline, task);
        Ok(handle)
    }

    /// Execute one task at the per-task isolation boundary.
    ///
    /// Completed and failed payloads are recorded in the execution log;
    /// failures are additionally routed to the error sink. Tombstoned
    /// tasks execute nothing and leave no trace in the log.
    fn execute(&self, task: Task) {
        let id = task.id();
        let kind = task.kind();
        match task.run() {
            RunOutcome::Completed => {
                log::trace!(target: LOG, "task.run id={} kind={:?}", id, kind);
                self.record.borrow_mut().push(LogEntry::new(id, kind));
            }
            RunOutcome::Skipped => {
                log::trace!(target: LOG, "task.skip id={} kind={:?}", id, kind);
            }
            RunOutcome::Failed(err) => {
                log::trace!(target: LOG, "task.fail id={} kind={:?}", id, kind);
                self.record.borrow_mut().push(LogEntry::new(id, kind));
                self.sink.task_failed(id, kind, &err);
            }
        }
    }

    /// Drain the priority queue, then the microtask queue, to exhaustion.
    ///
    /// Invoked after the synchronous block and after every macrotask
    /// callback. Priority work scheduled by a microtask runs before the
    /// next microtask, so the two queues alternate until both are empty.
    fn drain_ready(&self) {
        let mut executed = 0usize;
        loop {
            self.transition(Phase::DrainingPriority);
            while let Some(task) = self.priority.pop() {
                self.execute(task);
                self.note_drained(&mut executed);
            }
            let Some(task) = self.microtasks.pop() else {
                break;
            };
            self.transition(Phase::DrainingMicrotask);
            self.execute(task);
            self.note_drained(&mut executed);
        }
    }

    /// Iterate the staged macrotask phases until nothing is pending.
    ///
    /// Per iteration: fire the earliest-deadline batch of timers, then a
    /// snapshot of the poll queue, then a snapshot of the check queue,
    /// draining priority and microtasks after every single callback.
    fn run_phases(&self) {
        loop {
            let next_deadline = self.timers.next_deadline();
            if next_deadline.is_none() && self.poll.is_empty() && self.check.is_empty() {
                break;
            }

            if let Some(deadline) = next_deadline {
                self.transition(Phase::Timers);
                self.clock.advance_to(deadline);
                log::trace!(target: LOG, "tick.advance {}", self.clock.now());
                for task in self.timers.take_ready(self.clock.now()) {
                    self.transition(Phase::Timers);
                    self.execute(task);
                    self.drain_ready();
                }
            }

            self.transition(Phase::Poll);
            for _ in 0..self.poll.len() {
                let Some(task) = self.poll.pop() else {
                    break;
                };
                self.transition(Phase::Poll);
                self.execute(task);
                self.drain_ready();
            }

            self.transition(Phase::Check);
            for _ in 0..self.check.len() {
                let Some(task) = self.check.pop() else {
                    break;
                };
                self.transition(Phase::Check);
                self.execute(task);
                self.drain_ready();
            }
        }
    }

    fn note_drained(&self, executed: &mut usize) {
        *executed += 1;
        if let Some(limit) = self.starvation_limit.get() {
            if *executed > limit {
                panic!(
                    "starvation: drain pass executed {} tasks (limit {})",
                    *executed, limit
                );
            }
        }
    }
}

/// Schedule `payload` onto the current loop's priority queue.
///
/// See [`Handle::schedule_priority`].
///
/// ### Panics
/// Panics if called outside of [`EventLoop::run`].
pub fn schedule_priority<F>(payload: F) -> Result<TaskHandle, ScheduleError>
where
    F: FnOnce() + 'static,
{
    Handle::current().schedule_priority(payload)
}

/// Schedule `payload` onto the current loop's microtask queue.
///
/// See [`Handle::schedule_microtask`].
///
/// ### Panics
/// Panics if called outside of [`EventLoop::run`].
pub fn schedule_microtask<F>(payload: F) -> Result<TaskHandle, ScheduleError>
where
    F: FnOnce() + 'static,
{
    Handle::current().schedule_microtask(payload)
}

/// Schedule `payload` onto the current loop's timer heap.
///
/// See [`Handle::schedule_timer`].
///
/// ### Panics
/// Panics if called outside of [`EventLoop::run`].
pub fn schedule_timer<F>(payload: F, delay: u64) -> Result<TaskHandle, ScheduleError>
where
    F: FnOnce() + 'static,
{
    Handle::current().schedule_timer(payload, delay)
}

/// Schedule `payload` onto the current loop's poll queue.
///
/// See [`Handle::schedule_io`].
///
/// ### Panics
/// Panics if called outside of [`EventLoop::run`].
pub fn schedule_io<F>(payload: F) -> Result<TaskHandle, ScheduleError>
where
    F: FnOnce() + 'static,
{
    Handle::current().schedule_io(payload)
}

/// Schedule `payload` onto the current loop's check queue.
///
/// See [`Handle::schedule_check`].
///
/// ### Panics
/// Panics if called outside of [`EventLoop::run`].
pub fn schedule_check<F>(payload: F) -> Result<TaskHandle, ScheduleError>
where
    F: FnOnce() + 'static,
{
    Handle::current().schedule_check(payload)
}
