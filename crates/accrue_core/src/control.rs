//! Progress reporting and cooperative cancellation.
//!
//! The engine only talks to a [`RunObserver`]; it never assumes a thread,
//! channel or async runtime. [`RunControl`] is the stock implementation: a
//! handful of shared atomics that another thread can poll and cancel through.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SimulationPhase {
    Idle = 0,
    Validating = 1,
    DeterministicOnly = 2,
    MonteCarlo = 3,
    Completed = 4,
    Failed = 5,
    Cancelled = 6,
}

impl SimulationPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SimulationPhase::Validating,
            2 => SimulationPhase::DeterministicOnly,
            3 => SimulationPhase::MonteCarlo,
            4 => SimulationPhase::Completed,
            5 => SimulationPhase::Failed,
            6 => SimulationPhase::Cancelled,
            _ => SimulationPhase::Idle,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SimulationPhase::Completed | SimulationPhase::Failed | SimulationPhase::Cancelled
        )
    }
}

/// Receives run notifications. Every method has a no-op default.
///
/// `on_progress` is called once per Monte Carlo batch boundary with
/// `(completed_trials, total_trials)` and must return quickly.
pub trait RunObserver {
    fn on_phase(&self, _phase: SimulationPhase) {}

    fn on_progress(&self, _completed: usize, _total: usize) {}

    /// Polled before every batch.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that ignores everything and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Shared progress counters and cancellation flag.
///
/// Clones share state, so one clone can drive a run on a worker thread while
/// another reads progress and cancels from elsewhere.
#[derive(Debug, Clone)]
pub struct RunControl {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
}

impl RunControl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(AtomicU8::new(SimulationPhase::Idle as u8)),
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Completed fraction in `[0, 1]`; zero before the total is known.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed() as f64 / total as f64,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SimulationPhase {
        SimulationPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear counters and the cancel flag before reusing the control.
    pub fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        self.cancelled.store(false, Ordering::SeqCst);
        self.phase.store(SimulationPhase::Idle as u8, Ordering::Release);
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for RunControl {
    fn on_phase(&self, phase: SimulationPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.completed.store(completed, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
