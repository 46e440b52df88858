use std::cell::RefCell;
use std::rc::Rc;

use spindle_loop::sink::ErrorSink;
use spindle_loop::{EventLoop, Handle, TaskError, TaskId, TaskKind};

mod util;

use util::Recorder;

/// [`CollectingSink`] records failure reports for assertions.
#[derive(Debug, Clone, Default)]
struct CollectingSink {
    failures: Rc<RefCell<Vec<(TaskId, TaskKind, String)>>>,
}

impl ErrorSink for CollectingSink {
    fn task_failed(&self, id: TaskId, kind: TaskKind, error: &TaskError) {
        self.failures
            .borrow_mut()
            .push((id, kind, error.message().to_string()));
    }
}

/// A panicking payload is reported to the sink with its id and kind, and
/// the loop keeps executing later tasks.
#[test]
fn panicking_payload_is_isolated() {
    util::init_logging();
    let rec = Recorder::new();
    let sink = CollectingSink::default();
    let event_loop = EventLoop::with_error_sink(sink.clone());

    let doomed = Rc::new(RefCell::new(None));
    let captured = Rc::clone(&doomed);
    let sync = rec.clone();
    let log = event_loop.run(move |handle| {
        let task = handle
            .schedule_priority(|| panic!("payload exploded"))
            .unwrap();
        *captured.borrow_mut() = Some(task);
        handle.schedule_microtask(sync.mark("after")).unwrap();
    });

    assert_eq!(rec.events(), vec!["after"]);
    // The failed payload executed, so it stays in the log.
    assert_eq!(log.len(), 2);

    let failures = sink.failures.borrow();
    let doomed = doomed.borrow();
    let doomed = doomed.as_ref().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, doomed.id());
    assert_eq!(failures[0].1, TaskKind::Priority);
    assert!(failures[0].2.contains("payload exploded"));
    assert_eq!(log.position(doomed.id()), Some(0));
}

/// [`RecoverySink`] schedules follow-up work from inside the failure
/// report, exercising the sink-may-schedule contract.
struct RecoverySink {
    handle: Rc<RefCell<Option<Handle>>>,
    rec: Recorder,
}

impl ErrorSink for RecoverySink {
    fn task_failed(&self, _id: TaskId, _kind: TaskKind, _error: &TaskError) {
        let handle = self.handle.borrow().clone().unwrap();
        handle.schedule_microtask(self.rec.mark("recovered")).unwrap();
    }
}

#[test]
fn sink_may_schedule_follow_up_work() {
    util::init_logging();
    let rec = Recorder::new();
    let slot = Rc::new(RefCell::new(None));
    let sink = RecoverySink {
        handle: Rc::clone(&slot),
        rec: rec.clone(),
    };
    let event_loop = EventLoop::with_error_sink(sink);
    *slot.borrow_mut() = Some(event_loop.handle());

    let sync = rec.clone();
    event_loop.run(move |handle| {
        handle.schedule_priority(|| panic!("first failure")).unwrap();
        handle.schedule_check(sync.mark("check")).unwrap();
    });

    assert_eq!(rec.events(), vec!["recovered", "check"]);
}

/// Scenario: a timer cancelled before its deadline never runs, never
/// advances the tick, and the cancellation reports success.
#[test]
fn cancelled_timer_never_fires() {
    util::init_logging();
    let rec = Recorder::new();
    let event_loop = EventLoop::new();
    let loop_handle = event_loop.handle();

    let doomed = Rc::new(RefCell::new(None));
    let captured = Rc::clone(&doomed);
    let sync = rec.clone();
    let log = event_loop.run(move |handle| {
        let timer = handle.schedule_timer(sync.mark("doomed"), 5).unwrap();
        assert!(timer.cancel());
        *captured.borrow_mut() = Some(timer);
        handle.schedule_microtask(sync.mark("live")).unwrap();
    });

    assert_eq!(rec.events(), vec!["live"]);
    assert_eq!(loop_handle.current_tick(), 0);
    let doomed = doomed.borrow();
    assert_eq!(log.position(doomed.as_ref().unwrap().id()), None);
}

/// Cancelling a queued task from an earlier phase tombstones its slot; the
/// governing phase skips it.
#[test]
fn cancel_before_the_governing_phase_suppresses_the_payload() {
    util::init_logging();
    let rec = Recorder::new();
    let event_loop = EventLoop::new();

    let sync = rec.clone();
    event_loop.run(move |handle| {
        let check = handle.schedule_check(sync.mark("doomed")).unwrap();
        let inner = sync.clone();
        handle
            .schedule_io(move || {
                inner.note("poll");
                assert!(check.cancel());
            })
            .unwrap();
    });

    assert_eq!(rec.events(), vec!["poll"]);
}

/// Cancellation is idempotent while the task is queued and keeps
/// reporting success; once the payload ran it reports failure.
#[test]
fn cancel_reports_by_execution_state() {
    util::init_logging();
    let event_loop = EventLoop::new();

    let handles = Rc::new(RefCell::new(None));
    let captured = Rc::clone(&handles);
    event_loop.run(move |handle| {
        let cancelled = handle.schedule_microtask(|| {}).unwrap();
        let executed = handle.schedule_microtask(|| {}).unwrap();
        assert!(cancelled.cancel());
        assert!(cancelled.cancel());
        *captured.borrow_mut() = Some((cancelled, executed));
    });

    let handles = handles.borrow();
    let (cancelled, executed) = handles.as_ref().unwrap();
    assert!(cancelled.cancel());
    assert!(!executed.cancel());
    assert!(executed.is_complete());
}

/// A task cannot cancel itself once its payload is on the stack.
#[test]
fn cancel_from_inside_the_payload_fails() {
    util::init_logging();
    let event_loop = EventLoop::new();

    let slot: Rc<RefCell<Option<spindle_loop::TaskHandle>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    event_loop.run(move |handle| {
        let task = handle
            .schedule_priority(move || {
                let me = inner.borrow().clone().unwrap();
                assert!(!me.cancel());
            })
            .unwrap();
        *slot.borrow_mut() = Some(task);
    });
}

/// An overflowing timer deadline is rejected with a descriptive error and
/// no task is created.
#[test]
fn overflowing_deadline_is_rejected() {
    util::init_logging();
    let event_loop = EventLoop::new();
    let loop_handle = event_loop.handle();

    let seen = Rc::new(RefCell::new(None));
    let captured = Rc::clone(&seen);
    let log = event_loop.run(move |handle| {
        handle
            .schedule_timer(
                move || {
                    let err = spindle_loop::schedule_timer(|| {}, u64::MAX).unwrap_err();
                    assert!(!err.is_closed());
                    *captured.borrow_mut() = Some(err.to_string());
                },
                1,
            )
            .unwrap();
    });

    let seen = seen.borrow();
    let message = seen.as_ref().expect("error observed inside the callback");
    assert!(message.contains("overflows the tick counter"));
    // Only the probing timer itself executed.
    assert_eq!(log.len(), 1);
    assert_eq!(loop_handle.current_tick(), 1);
}

/// Every scheduling operation reports `Closed` once the loop has shut
/// down.
#[test]
fn closed_loop_rejects_all_scheduling() {
    util::init_logging();
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    event_loop.run(|_| {});
    assert!(handle.is_closed());

    assert!(handle.schedule_priority(|| {}).unwrap_err().is_closed());
    assert!(handle.schedule_microtask(|| {}).unwrap_err().is_closed());
    assert!(handle.schedule_timer(|| {}, 0).unwrap_err().is_closed());
    assert!(handle.schedule_io(|| {}).unwrap_err().is_closed());
    assert!(handle.schedule_check(|| {}).unwrap_err().is_closed());
}
