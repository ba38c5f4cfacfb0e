//! # Phase Sequencer
//!
//! Multi-step transitions driven from the host's update loop.
//!
//! A phase owns a list of [`Step`]s and a shared [`CancellationToken`].
//! The host calls [`Phase::start`] once and [`Phase::update`] every tick;
//! `update` polls the running steps once with a no-op waker and never
//! blocks. Steps that need real concurrency spawn onto their own executor
//! and await the result.
//!
//! | Phase | Launches | Done when |
//! |-------|----------|-----------|
//! | [`SequentialPhase`] | one step at a time, in order | the last step completed |
//! | [`ParallelPhase`] | every step at `start` | every step completed |
//! | [`PhaseQueue`] | one phase at a time | the last phase is done |
//!
//! A phase with no steps is done as soon as it is built, and a done phase
//! stays done.
//!
//! # Failure
//!
//! A failing step is recorded in [`Phase::errors`]. With `fail_fast` (the
//! default) it also cancels the shared token, and a sequential phase stops
//! launching further steps.

mod parallel;
mod queue;
mod sequential;
mod step;

pub use parallel::ParallelPhase;
pub use queue::PhaseQueue;
pub use sequential::SequentialPhase;
pub use step::{BoxStep, Cancelled, DynStep, Step, boxed};
pub use tokio_util::sync::CancellationToken;

use futures::{FutureExt, future::BoxFuture};
use std::task::{Context, Poll};
use weft_core::BoxError;

/// Common contract of every phase executor.
pub trait Phase: Send {
    /// Launch the phase. Calling it again has no effect.
    fn start(&mut self);

    /// Poll the phase once. Returns whether it is done.
    ///
    /// Starts the phase if [`start`](Phase::start) was never called.
    fn update(&mut self) -> bool;

    /// Whether the phase is done.
    fn is_done(&self) -> bool;

    /// Cancel the shared token.
    fn cancel(&self);

    /// Errors of failed steps, in completion order.
    fn errors(&self) -> &[BoxError];

    /// Move the recorded errors out.
    fn take_errors(&mut self) -> Vec<BoxError>;
}

pub(crate) type Running = BoxFuture<'static, Result<(), BoxError>>;

/// Poll `future` once without a real waker.
pub(crate) fn poll_once(future: &mut Running) -> Poll<Result<(), BoxError>> {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    future.poll_unpin(&mut cx)
}
