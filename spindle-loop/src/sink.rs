//! Failure reporting for task payloads.
//!
//! A payload that panics is caught at the per-task boundary inside the
//! loop driver and handed to the installed [`ErrorSink`]; the loop itself
//! keeps running. Install a sink with
//! [`EventLoop::with_error_sink`](crate::EventLoop::with_error_sink).

use spindle_task::{TaskError, TaskId, TaskKind};

const LOG: &str = "spindle_loop::sink";

/// Receives per-task failure reports from the loop driver.
pub trait ErrorSink {
    /// Report that the payload of task `id` panicked.
    ///
    /// Called synchronously from the loop between task executions; the
    /// sink may schedule follow-up work through a loop handle.
    fn task_failed(&self, id: TaskId, kind: TaskKind, error: &TaskError);
}

/// Default [`ErrorSink`] which reports failures through [`log`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn task_failed(&self, id: TaskId, kind: TaskKind, error: &TaskError) {
        log::error!(target: LOG, "task.fail id={} kind={:?}: {}", id, kind, error);
    }
}
