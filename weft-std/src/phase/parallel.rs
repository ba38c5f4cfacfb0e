//! Concurrent phase execution.

use super::{BoxStep, Phase, Running, Step, poll_once};
use std::task::Poll;
use tokio_util::sync::CancellationToken;
use weft_core::BoxError;

/// Launches every step at once and is done when all of them completed.
pub struct ParallelPhase {
    pending: Vec<BoxStep>,
    running: Vec<Option<Running>>,
    token: CancellationToken,
    fail_fast: bool,
    started: bool,
    errors: Vec<BoxError>,
}

impl Default for ParallelPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelPhase {
    /// A phase with no steps (already done).
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            running: Vec::new(),
            token: CancellationToken::new(),
            fail_fast: true,
            started: false,
            errors: Vec::new(),
        }
    }

    /// A phase running `steps` concurrently.
    pub fn from_steps(steps: impl IntoIterator<Item = BoxStep>) -> Self {
        let mut phase = Self::new();
        phase.pending.extend(steps);
        phase
    }

    /// Add a step.
    pub fn step<S: Step>(mut self, step: S) -> Self {
        self.pending.push(Box::new(step));
        self
    }

    /// Cancel the other steps when one fails (default `true`).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Share `token` instead of a fresh one.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// The shared token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of steps still running.
    pub fn remaining(&self) -> usize {
        self.pending.len() + self.running.iter().flatten().count()
    }
}

impl Phase for ParallelPhase {
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        tracing::debug!(steps = self.pending.len(), "launching parallel phase");
        let token = self.token.clone();
        self.running = self
            .pending
            .drain(..)
            .map(|step| Some(step.run_dyn(token.clone())))
            .collect();
    }

    fn update(&mut self) -> bool {
        self.start();
        for (index, slot) in self.running.iter_mut().enumerate() {
            let Some(running) = slot.as_mut() else {
                continue;
            };
            let Poll::Ready(result) = poll_once(running) else {
                continue;
            };
            *slot = None;
            tracing::debug!(step = index, ok = result.is_ok(), "step completed");
            if let Err(err) = result {
                tracing::warn!(step = index, error = %err, "step failed");
                self.errors.push(err);
                if self.fail_fast {
                    self.token.cancel();
                }
            }
        }
        self.is_done()
    }

    fn is_done(&self) -> bool {
        self.remaining() == 0
    }

    fn cancel(&self) {
        self.token.cancel();
    }

    fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    fn take_errors(&mut self) -> Vec<BoxError> {
        std::mem::take(&mut self.errors)
    }
}
