/// Error returned from timer operations.
#[derive(thiserror::Error, Debug, Clone, Copy)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn deadline_overflow() -> Self {
        Self {
            kind: ErrorKind::DeadlineOverflow,
        }
    }
}

/// The kind of timer error.
#[derive(thiserror::Error, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// The requested delay pushes the deadline past the representable
    /// tick range.
    #[error("timer deadline overflows the tick counter")]
    DeadlineOverflow,
}
