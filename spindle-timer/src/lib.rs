//! Logical-time timer storage for the spindle event loop.
//!
//! Timers are keyed by `(deadline, sequence)` so that expiry is a total
//! order: earlier deadlines fire first, and equal deadlines fire in
//! scheduling order. Time is a bare tick counter with no wall-clock
//! binding, which keeps runs deterministic and replayable.
#![deny(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::missing_safety_doc
)]
mod clock;
mod error;
mod heap;

pub use clock::Clock;
pub use error::{Error, ErrorKind};
pub use heap::TimerHeap;
