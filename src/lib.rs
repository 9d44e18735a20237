//! Callback-driven try/catch-style error short-circuiting.
//!
//! A sequence of fallible calls normally needs a branch after every one of
//! them. A *try block* routes each call's error position through a single
//! decision callback instead: the block runs until the callback rejects an
//! error, and [`run`] returns that error wrapped in a [`TryError`] that
//! records which checkpoint produced it. Checkpoints are ordinary calls, so
//! a block can still mix `check` with plain `match`-style handling wherever
//! fine-grained control is worth the branch.
//!
//! The block runs on its own scoped worker thread so that an abort can
//! unwind without touching the caller's stack. Genuine panics inside the
//! block are never swallowed and never turned into an `Err`: they re-raise
//! at the [`run`] call site wrapped in a [`TryPanic`] that preserves the
//! payload and the fault-site backtrace.
//!
//! # Example
//!
//! ```
//! fn fact(n: i64) -> Result<i64, String> {
//!     if n < 0 {
//!         return Err("n should be >= 0".to_string());
//!     }
//!     Ok((1..=n).product())
//! }
//!
//! let outcome = tryblock::run_with(
//!     |t| {
//!         t.check(fact(10));
//!         t.check(fact(-1));
//!         unreachable!("the rejection above aborts the block");
//!     },
//!     |err| match err {
//!         None => true,
//!         Some(err) => err.to_string() == "OK",
//!     },
//! );
//!
//! let err = outcome.unwrap_err();
//! assert_eq!(err.nth(), 2);
//! assert_eq!(err.to_string(), "n should be >= 0");
//! ```
//!
//! # Limitations
//!
//! - No cancellation or timeout: a block runs to completion, abort, or
//!   panic.
//! - Each invocation spawns one OS thread and blocks the caller until the
//!   outcome is in; the mechanism is synchronous end to end.
//! - The [`Try`] handle is single-threaded (`!Sync`); it cannot be shared
//!   with other threads spawned inside the block.

mod checkpoint;
mod error;
mod runner;
mod trace;

pub use checkpoint::{Checkpoint, Inspection, Try};
pub use error::{BoxError, TryError, TryPanic};
pub use runner::{DefaultCatch, run, run_with};
