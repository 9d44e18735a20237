//! Terminal data shapes: the rejected-error wrapper and the captured-panic
//! record.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use thiserror::Error;

/// Boxed error type carried through checkpoints and decision callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error that stopped a try block.
///
/// Wraps the rejected error together with the 1-based ordinal of the
/// checkpoint call that produced it. `Display` shows the underlying error's
/// message; the underlying error itself is reachable through
/// [`std::error::Error::source`].
///
/// The underlying error is optional because a decision callback is allowed to
/// reject an *empty* error position; in that case `source()` is `None` and
/// `Display` renders a fixed message.
#[derive(Debug, Error)]
#[error("{}", stop_message(.source))]
pub struct TryError {
    #[source]
    source: Option<BoxError>,
    nth: usize,
}

impl TryError {
    pub(crate) fn new(source: Option<BoxError>, nth: usize) -> Self {
        Self { source, nth }
    }

    /// 1-based ordinal of the checkpoint call that rejected the error.
    #[must_use]
    pub fn nth(&self) -> usize {
        self.nth
    }

    /// Consume the wrapper and return the underlying error, if one was
    /// present.
    #[must_use]
    pub fn into_source(self) -> Option<BoxError> {
        self.source
    }
}

fn stop_message(source: &Option<BoxError>) -> String {
    source.as_ref().map_or_else(
        || "checkpoint rejected without an underlying error".to_string(),
        ToString::to_string,
    )
}

/// A panic captured inside a try block.
///
/// Preserves the raw payload, a rendered message, and a backtrace captured at
/// the original panic site inside the worker, so re-raising at the
/// [`run`](crate::run) call site does not lose where the fault happened.
/// Recover it with `catch_unwind` and a downcast:
///
/// ```
/// use tryblock::TryPanic;
///
/// let unwound = std::panic::catch_unwind(|| {
///     let _ = tryblock::run(|_t| panic!("boom"));
/// });
/// let fault = unwound.unwrap_err().downcast::<TryPanic>().unwrap();
/// assert_eq!(fault.message(), "boom");
/// ```
pub struct TryPanic {
    payload: Box<dyn Any + Send>,
    message: String,
    backtrace: Backtrace,
}

impl TryPanic {
    pub(crate) fn new(payload: Box<dyn Any + Send>, backtrace: Backtrace) -> Self {
        let message = panic_message(&*payload);
        Self {
            payload,
            message,
            backtrace,
        }
    }

    /// The raw panic payload as it unwound out of the block.
    #[must_use]
    pub fn payload(&self) -> &(dyn Any + Send) {
        &*self.payload
    }

    /// Rendered panic message (`&str` and `String` payloads; a placeholder
    /// otherwise).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace captured at the original panic site, before the worker
    /// unwound.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for TryPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "try block panic: {}\n{}", self.message, self.backtrace)
    }
}

impl fmt::Debug for TryPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryPanic")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
