//! Fault-site backtrace capture.
//!
//! The default panic hook prints the backtrace and discards it; by the time a
//! worker's `catch_unwind` observes the payload, the original frames are
//! gone. A chained hook records the backtrace into a thread-local slot while
//! a worker is armed, so the runner can attach the fault-site trace to the
//! record it re-raises.

use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic;
use std::sync::Once;

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: Cell<Option<Backtrace>> = const { Cell::new(None) };
}

static INSTALL: Once = Once::new();

/// Chain a capture step in front of whatever hook is already installed.
/// Process-wide, installed once, transparent to panics outside a try block.
fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if ARMED.with(Cell::get) {
                CAPTURED.with(|slot| slot.set(Some(Backtrace::force_capture())));
            }
            previous(info);
        }));
    });
}

/// Arm capture on the current thread until the guard drops.
///
/// Nesting-safe: the guard restores the prior armed state, so an inner
/// invocation running on an outer invocation's worker does not disarm it.
pub(crate) fn arm() -> CaptureGuard {
    install();
    let was_armed = ARMED.with(|armed| armed.replace(true));
    if !was_armed {
        CAPTURED.with(Cell::take);
    }
    CaptureGuard { was_armed }
}

/// Take the most recent fault-site backtrace, falling back to a capture at
/// the call site when the unwind bypassed the hook (a nested
/// `resume_unwind`).
pub(crate) fn take() -> Backtrace {
    CAPTURED
        .with(Cell::take)
        .unwrap_or_else(Backtrace::force_capture)
}

pub(crate) struct CaptureGuard {
    was_armed: bool,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        ARMED.with(|armed| armed.set(self.was_armed));
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::{arm, take};

    #[test]
    fn armed_capture_records_the_panicking_frame() {
        let guard = arm();
        let unwound = catch_unwind(AssertUnwindSafe(|| panic!("for the trace")));
        drop(guard);

        assert!(unwound.is_err());
        assert!(!take().to_string().is_empty());
    }

    #[test]
    fn take_falls_back_to_a_boundary_capture() {
        // Nothing armed, nothing panicked: still a non-empty trace.
        assert!(!take().to_string().is_empty());
    }
}
