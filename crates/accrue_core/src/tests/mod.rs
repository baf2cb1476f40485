//! Integration tests for the accrue simulation engine
//!
//! Tests are organized by topic:
//! - `deterministic` - Projection, sensitivity and the end-to-end sample plan
//! - `monte_carlo` - Sampling runs, yearly statistics and scenarios
//! - `orchestrator` - Validation order, phases, progress and cancellation

mod orchestrator;

use std::cell::RefCell;

use crate::control::{RunObserver, SimulationPhase};

pub(crate) fn relative_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
}

/// Observer that records every notification and cancels on request.
#[derive(Default)]
pub(crate) struct Recorder {
    pub phases: RefCell<Vec<SimulationPhase>>,
    pub progress: RefCell<Vec<(usize, usize)>>,
    pub cancel: bool,
}

impl RunObserver for Recorder {
    fn on_phase(&self, phase: SimulationPhase) {
        self.phases.borrow_mut().push(phase);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.progress.borrow_mut().push((completed, total));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
    }
}
