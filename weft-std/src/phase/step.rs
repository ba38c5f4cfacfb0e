//! Phase steps.

use futures::future::BoxFuture;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use weft_core::BoxError;

/// A step gave up because its phase was cancelled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("step cancelled")]
pub struct Cancelled;

/// One asynchronous unit of a phase.
///
/// The step receives the phase's shared cancellation token. Observing it
/// is up to the step; one that ignores it runs to completion.
///
/// Closures `FnOnce(CancellationToken) -> impl Future<Output = Result<(), BoxError>>`
/// implement this trait.
pub trait Step: Send + 'static {
    /// Start the step.
    fn run(
        self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send + 'static;
}

impl<F, Fut> Step for F
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn run(
        self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), BoxError>> + Send + 'static {
        self(cancel)
    }
}

/// Dynamic object-safe version of [`Step`].
pub trait DynStep: Send + 'static {
    /// Start the step (dynamic dispatch version).
    fn run_dyn(
        self: Box<Self>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), BoxError>>;
}

impl<S: Step> DynStep for S {
    fn run_dyn(
        self: Box<Self>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), BoxError>> {
        Box::pin((*self).run(cancel))
    }
}

/// A boxed step.
pub type BoxStep = Box<dyn DynStep>;

/// Box a step.
pub fn boxed<S: Step>(step: S) -> BoxStep {
    Box::new(step)
}
