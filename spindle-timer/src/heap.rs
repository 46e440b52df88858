use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use spindle_task::Task;

/// Min-heap of pending timers keyed by `(deadline, sequence)`.
///
/// Equal deadlines pop in scheduling order. Cancelled entries keep their
/// slot and are purged lazily when they surface at the top of the heap, so
/// cancellation itself never restructures the heap.
///
/// Interior mutability allows timer callbacks to register new timers while
/// the loop driver holds the heap.
pub struct TimerHeap {
    entries: RefCell<BinaryHeap<Entry>>,
}

struct Entry {
    deadline: u64,
    task: Task,
}

impl Entry {
    fn key(&self) -> (u64, u64) {
        (self.deadline, self.task.id().sequence())
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // `BinaryHeap` is a max-heap; the ordering is reversed so the earliest
    // `(deadline, sequence)` pair surfaces first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl TimerHeap {
    /// Construct an empty heap.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(BinaryHeap::new()),
        }
    }

    /// Register a task to fire at `deadline`.
    pub fn push(&self, deadline: u64, task: Task) {
        self.entries.borrow_mut().push(Entry { deadline, task });
    }

    /// The deadline of the earliest live timer.
    ///
    /// Cancelled entries at the top of the heap are dropped on the way, so
    /// a tombstoned deadline never drives the clock forward.
    pub fn next_deadline(&self) -> Option<u64> {
        let mut entries = self.entries.borrow_mut();
        while let Some(entry) = entries.peek() {
            if !entry.task.is_cancelled() {
                return Some(entry.deadline);
            }
            entries.pop();
        }
        None
    }

    /// Extract every live timer with `deadline <= now`, earliest first.
    pub fn take_ready(&self, now: u64) -> Vec<Task> {
        let mut ready = Vec::new();
        let mut entries = self.entries.borrow_mut();
        while entries.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = entries.pop() {
                if !entry.task.is_cancelled() {
                    ready.push(entry.task);
                }
            }
        }
        ready
    }

    /// Returns true if no live timers remain.
    pub fn is_empty(&self) -> bool {
        self.next_deadline().is_none()
    }

    /// Number of stored entries, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl Default for TimerHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHeap").field("len", &self.len()).finish()
    }
}
