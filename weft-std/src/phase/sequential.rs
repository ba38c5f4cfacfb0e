//! Ordered phase execution.

use super::{BoxStep, Phase, Running, Step, poll_once};
use std::{collections::VecDeque, task::Poll};
use tokio_util::sync::CancellationToken;
use weft_core::BoxError;

/// Runs its steps one after another.
///
/// `start` launches the first step only. Each `update` polls the current
/// step; once it completes, the next one is launched and polled in the
/// same tick.
pub struct SequentialPhase {
    pending: VecDeque<BoxStep>,
    current: Option<Running>,
    token: CancellationToken,
    fail_fast: bool,
    started: bool,
    done: bool,
    launched: usize,
    errors: Vec<BoxError>,
}

impl Default for SequentialPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialPhase {
    /// A phase with no steps (already done).
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            token: CancellationToken::new(),
            fail_fast: true,
            started: false,
            done: true,
            launched: 0,
            errors: Vec::new(),
        }
    }

    /// A phase running `steps` in order.
    pub fn from_steps(steps: impl IntoIterator<Item = BoxStep>) -> Self {
        let mut phase = Self::new();
        phase.pending.extend(steps);
        phase.done = phase.pending.is_empty();
        phase
    }

    /// Append a step.
    pub fn step<S: Step>(mut self, step: S) -> Self {
        self.pending.push_back(Box::new(step));
        self.done = false;
        self
    }

    /// Stop at the first failing step (default `true`).
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

    /// Number of steps launched so far.
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Launch the next pending step. Returns `false` when none is left.
    fn launch_next(&mut self) -> bool {
        if self.token.is_cancelled() && !self.pending.is_empty() {
            tracing::debug!(
                skipped = self.pending.len(),
                "phase cancelled, skipping remaining steps"
            );
            self.pending.clear();
        }
        let Some(step) = self.pending.pop_front() else {
            tracing::debug!(steps = self.launched, "sequential phase done");
            return false;
        };
        tracing::debug!(step = self.launched, "launching step");
        self.current = Some(step.run_dyn(self.token.clone()));
        self.launched += 1;
        true
    }
}

impl Phase for SequentialPhase {
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if !self.done {
            self.done = !self.launch_next();
        }
    }

    fn update(&mut self) -> bool {
        self.start();
        while !self.done {
            let Some(current) = self.current.as_mut() else {
                self.done = !self.launch_next();
                continue;
            };
            let Poll::Ready(result) = poll_once(current) else {
                return false;
            };
            self.current = None;
            if let Err(err) = result {
                tracing::warn!(step = self.launched - 1, error = %err, "step failed");
                self.errors.push(err);
                if self.fail_fast {
                    self.token.cancel();
                }
            }
            self.done = !self.launch_next();
        }
        true
    }

    fn is_done(&self) -> bool {
        self.done
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
