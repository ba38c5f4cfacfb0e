//! Back-to-back phases.

use super::Phase;
use std::collections::VecDeque;
use weft_core::BoxError;

/// Runs phases one after another as a single transition.
///
/// The next phase starts in the tick its predecessor finishes. With
/// `fail_fast` (the default), a phase that finishes with errors ends the
/// queue.
pub struct PhaseQueue {
    phases: VecDeque<Box<dyn Phase>>,
    fail_fast: bool,
    started: bool,
    finished: usize,
    errors: Vec<BoxError>,
}

impl Default for PhaseQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseQueue {
    /// An empty queue (already done).
    pub fn new() -> Self {
        Self {
            phases: VecDeque::new(),
            fail_fast: true,
            started: false,
            finished: 0,
            errors: Vec::new(),
        }
    }

    /// Append a phase.
    pub fn then<P: Phase + 'static>(mut self, phase: P) -> Self {
        self.phases.push_back(Box::new(phase));
        self
    }

    /// Stop at the first phase that finishes with errors (default `true`).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Number of phases finished so far.
    pub fn finished(&self) -> usize {
        self.finished
    }
}

impl Phase for PhaseQueue {
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(phase) = self.phases.front_mut() {
            phase.start();
        }
    }

    fn update(&mut self) -> bool {
        self.start();
        while let Some(phase) = self.phases.front_mut() {
            if !phase.update() {
                return false;
            }
            let errors = phase.take_errors();
            self.phases.pop_front();
            self.finished += 1;
            tracing::debug!(phase = self.finished - 1, errors = errors.len(), "phase finished");

            let failed = !errors.is_empty();
            self.errors.extend(errors);
            if failed && self.fail_fast {
                tracing::debug!(skipped = self.phases.len(), "queue stopped after failure");
                self.phases.clear();
            }
        }
        true
    }

    fn is_done(&self) -> bool {
        self.phases.is_empty()
    }

    fn cancel(&self) {
        for phase in &self.phases {
            phase.cancel();
        }
    }

    fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    fn take_errors(&mut self) -> Vec<BoxError> {
        std::mem::take(&mut self.errors)
    }
}
