//! The execution engine: isolated worker, one-shot outcome channel, and the
//! unwind boundary that tells aborts apart from genuine panics.

use std::any::Any;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::{Arc, mpsc};
use std::thread;

use tracing::debug;

use crate::checkpoint::Try;
use crate::error::{TryError, TryPanic};
use crate::trace;

/// Abort signal payload. One per engine invocation, compared by identity, so
/// no value a block can construct or raise collides with it.
#[derive(Clone)]
pub(crate) struct Sentinel(Arc<()>);

impl Sentinel {
    pub(crate) fn fresh() -> Self {
        Self(Arc::new(()))
    }

    fn same_invocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The single outcome a worker reports. Exactly one per invocation.
enum Outcome {
    Completed,
    Aborted(TryError),
    Faulted(TryPanic),
}

/// Decision policy used by [`run`]: continue while the error position is
/// empty, abort on the first error.
pub type DefaultCatch = fn(Option<&(dyn Error + Send + Sync)>) -> bool;

fn default_catch(err: Option<&(dyn Error + Send + Sync)>) -> bool {
    err.is_none()
}

/// Run `block` with the default decision policy: abort at the first
/// checkpoint whose error position holds an error.
pub fn run<B>(block: B) -> Result<(), TryError>
where
    B: FnOnce(&Try<DefaultCatch>) + Send,
{
    run_with(block, default_catch as DefaultCatch)
}

/// Run `block` on its own worker thread, routing every checkpoint with an
/// error position through `catch`.
///
/// The worker is scoped, so both closures may borrow from the caller's
/// stack. The caller blocks until the worker reports its single outcome:
///
/// - the block ran to completion with no rejection: `Ok(())`;
/// - `catch` rejected a checkpoint: `Err(`[`TryError`]`)` stamped with that
///   checkpoint's 1-based ordinal;
/// - the block panicked for any unrelated reason: the panic is re-raised
///   here, wrapped in a [`TryPanic`] that preserves the payload and the
///   fault-site backtrace. It is never converted into an `Err`.
///
/// Invocations nest freely; an inner invocation's abort is resolved at its
/// own boundary, and an outer block only ever sees the inner return value.
///
/// There is no cancellation or timeout: the block runs to completion, abort,
/// or panic.
pub fn run_with<B, C>(block: B, catch: C) -> Result<(), TryError>
where
    B: FnOnce(&Try<C>) + Send,
    C: FnMut(Option<&(dyn Error + Send + Sync)>) -> bool + Send,
{
    let outcome = thread::scope(|scope| {
        let (outcome_tx, outcome_rx) = mpsc::sync_channel::<Outcome>(1);
        let _worker = thread::Builder::new()
            .name("tryblock-worker".to_string())
            .spawn_scoped(scope, move || {
                let sentinel = Sentinel::fresh();
                let tryer = Try::new(sentinel.clone(), catch);
                let _capture = trace::arm();
                let unwound = catch_unwind(AssertUnwindSafe(|| block(&tryer)));
                let _ = outcome_tx.send(classify(unwound, &sentinel, &tryer));
            })
            .expect("failed to spawn try block worker");
        outcome_rx
            .recv()
            .expect("try block worker reports exactly one outcome")
    });

    match outcome {
        Outcome::Completed => Ok(()),
        Outcome::Aborted(err) => Err(err),
        Outcome::Faulted(fault) => resume_unwind(Box::new(fault)),
    }
}

/// Classify what came out of the block. Runs inside the worker, before the
/// outcome crosses the channel, so the fault-site backtrace is still at
/// hand. Sentinel recognition is by identity: a sentinel from any other
/// invocation is treated as a genuine panic.
fn classify<C>(unwound: thread::Result<()>, sentinel: &Sentinel, tryer: &Try<C>) -> Outcome {
    match unwound {
        Ok(()) => Outcome::Completed,
        Err(payload) => match payload.downcast::<Sentinel>() {
            Ok(signal) if signal.same_invocation(sentinel) => Outcome::Aborted(
                tryer
                    .take_stop()
                    .expect("abort signal raised without a recorded error"),
            ),
            Ok(foreign) => faulted(foreign),
            Err(payload) => faulted(payload),
        },
    }
}

fn faulted(payload: Box<dyn Any + Send>) -> Outcome {
    let fault = TryPanic::new(payload, trace::take());
    debug!(panic = fault.message(), "re-raising panic from try block");
    Outcome::Faulted(fault)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{DefaultCatch, Outcome, Sentinel, classify, default_catch, run, run_with};
    use crate::checkpoint::Try;

    #[test]
    fn empty_block_completes() {
        assert!(run(|_t| {}).is_ok());
    }

    #[test]
    fn default_policy_rejects_the_first_error() {
        let err = run(|t| {
            t.check(Ok::<_, io::Error>(1));
            t.check(Err::<(), _>(io::Error::other("bad read")));
        })
        .unwrap_err();

        assert_eq!(err.nth(), 2);
        assert_eq!(err.to_string(), "bad read");
    }

    #[test]
    fn sentinels_match_by_identity_not_value() {
        let ours = Sentinel::fresh();
        assert!(ours.same_invocation(&ours.clone()));
        assert!(!ours.same_invocation(&Sentinel::fresh()));
    }

    #[test]
    fn foreign_sentinel_is_a_fault_not_an_abort() {
        let ours = Sentinel::fresh();
        let tryer = Try::new(ours.clone(), default_catch as DefaultCatch);

        let outcome = classify(Err(Box::new(Sentinel::fresh())), &ours, &tryer);

        assert!(matches!(outcome, Outcome::Faulted(_)));
    }

    #[test]
    fn panicking_catch_surfaces_as_a_fault() {
        let unwound = std::panic::catch_unwind(|| {
            let _ = run_with(
                |t| t.check(None::<io::Error>),
                |_err| panic!("catch blew up"),
            );
        });

        let fault = unwound
            .unwrap_err()
            .downcast::<crate::TryPanic>()
            .expect("payload must be a TryPanic");
        assert_eq!(fault.message(), "catch blew up");
    }
}
