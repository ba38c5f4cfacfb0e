//! Testing utilities for weft.
//!
//! # Features
//!
//! - [`Journal`]: records labelled calls in order and hands out invokers
//!   that write to it
//! - [`Gate`]: a phase step that finishes only when the test opens it

use crate::phase::{Cancelled, Step};
use futures::{
    channel::oneshot,
    future::{self, Either},
};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;
use weft_core::{BoxError, Invoker};

// ============================================================================
// Journal
// ============================================================================

/// An ordered record of calls.
///
/// # Example
///
/// ```rust
/// use weft_std::testing::Journal;
/// use weft_core::Invocation;
///
/// let journal = Journal::new();
/// let before = journal.recorder("before");
/// before.invoke(&mut Invocation::with_args(&[])).unwrap();
/// assert_eq!(journal.entries(), vec!["before"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `label`.
    pub fn record(&self, label: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label.into());
    }

    /// Recorded labels, in call order.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// An invoker that records `label` and succeeds.
    ///
    /// It ignores its receiver, arguments and join point, so it can stand
    /// in for any handler.
    pub fn recorder(&self, label: impl Into<String>) -> Invoker {
        let journal = self.clone();
        let label = label.into();
        Invoker::new(move |_| {
            journal.record(label.clone());
            Ok(())
        })
    }

    /// An invoker that records `label` and fails with `message`.
    pub fn failing(&self, label: impl Into<String>, message: impl Into<String>) -> Invoker {
        let journal = self.clone();
        let label = label.into();
        let message = message.into();
        Invoker::new(move |_| {
            journal.record(label.clone());
            Err(message.clone().into())
        })
    }
}

// ============================================================================
// Gate
// ============================================================================

struct GateState {
    launched: AtomicBool,
    finished: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<Result<(), String>>>>,
    receiver: Mutex<Option<oneshot::Receiver<Result<(), String>>>>,
}

/// A step the test completes by hand.
///
/// # Example
///
/// ```rust,ignore
/// let gate = Gate::new();
/// let mut phase = SequentialPhase::new().step(gate.step());
/// phase.start();
/// assert!(gate.is_launched());
/// assert!(!phase.update());
/// gate.open();
/// assert!(phase.update());
/// ```
#[derive(Clone)]
pub struct Gate {
    state: Arc<GateState>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            state: Arc::new(GateState {
                launched: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
                receiver: Mutex::new(Some(receiver)),
            }),
        }
    }

    /// The step guarded by this gate. A gate backs a single step.
    ///
    /// The step finishes with the gate's outcome, or with [`Cancelled`]
    /// if the phase token is cancelled first.
    pub fn step(&self) -> impl Step {
        let state = self.state.clone();
        move |cancel: CancellationToken| {
            state.launched.store(true, Ordering::SeqCst);
            let receiver = state
                .receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            async move {
                let Some(receiver) = receiver else {
                    return Err("gate already backs a step".into());
                };
                let cancelled = std::pin::pin!(cancel.cancelled());
                let selected = future::select(receiver, cancelled).await;
                let outcome: Result<(), BoxError> = match selected {
                    Either::Left((Ok(Ok(())), _)) => Ok(()),
                    Either::Left((Ok(Err(message)), _)) => Err(message.into()),
                    Either::Left((Err(canceled), _)) => Err(canceled.into()),
                    Either::Right(((), _)) => Err(Cancelled.into()),
                };
                state.finished.store(true, Ordering::SeqCst);
                outcome
            }
        }
    }

    /// Whether the step has been launched.
    pub fn is_launched(&self) -> bool {
        self.state.launched.load(Ordering::SeqCst)
    }

    /// Whether the step has finished.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::SeqCst)
    }

    /// Let the step succeed.
    pub fn open(&self) {
        self.resolve(Ok(()));
    }

    /// Let the step fail with `message`.
    pub fn fail(&self, message: impl Into<String>) {
        self.resolve(Err(message.into()));
    }

    fn resolve(&self, outcome: Result<(), String>) {
        let sender = self
            .state
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Invocation;

    #[test]
    fn test_journal_records_in_order() {
        let journal = Journal::new();
        journal
            .recorder("a")
            .invoke(&mut Invocation::with_args(&[]))
            .unwrap();
        let err = journal
            .failing("b", "nope")
            .invoke(&mut Invocation::with_args(&[]))
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(journal.entries(), vec!["a", "b"]);
    }
}
