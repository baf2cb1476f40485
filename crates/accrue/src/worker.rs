//! Background worker for running simulations off the main thread.

use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use accrue_core::model::{MonteCarloConfig, SimulationParameters, SimulationResult};
use accrue_core::{RunControl, RunObserver, SimulationError, SimulationPhase};

/// How often [`SimulationWorker::wait`] wakes up to report progress.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Request sent to the background worker
#[derive(Debug)]
pub enum SimulationRequest {
    /// Validate and run one simulation
    Run {
        params: Box<SimulationParameters>,
        config: MonteCarloConfig,
    },
    /// Graceful shutdown
    Shutdown,
}

/// Response from the background worker
#[derive(Debug)]
pub enum SimulationResponse {
    /// Simulation completed (boxed to reduce enum size)
    Complete(Box<SimulationResult>),
    /// Simulation was cancelled
    Cancelled,
    /// Validation or execution failed
    Failed(SimulationError),
}

/// Background worker that runs simulations on a separate thread
pub struct SimulationWorker {
    request_tx: Sender<SimulationRequest>,
    response_rx: Receiver<SimulationResponse>,
    control: RunControl,
    thread: Option<JoinHandle<()>>,
}

impl SimulationWorker {
    /// Create a new simulation worker with a background thread
    pub fn new() -> Self {
        let (request_tx, request_rx) = channel();
        let (response_tx, response_rx) = channel();
        let control = RunControl::new();

        let ctx = WorkerContext {
            response_tx,
            control: control.clone(),
        };

        let thread = thread::spawn(move || {
            ctx.run(request_rx);
        });

        Self {
            request_tx,
            response_rx,
            control,
            thread: Some(thread),
        }
    }

    /// Send a simulation request to the worker
    pub fn send(&self, request: SimulationRequest) -> bool {
        // Clear progress and cancel flag for new work
        self.control.reset();
        self.request_tx.send(request).is_ok()
    }

    /// `(completed, total)` trials of the current Monte Carlo run
    pub fn progress(&self) -> (usize, usize) {
        (self.control.completed(), self.control.total())
    }

    pub fn phase(&self) -> SimulationPhase {
        self.control.phase()
    }

    /// Request cancellation of the current operation
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    /// Block until the current request answers.
    ///
    /// `on_progress` is called whenever the completed count moves. Once
    /// `timeout` elapses the run is cancelled; the worker then answers with
    /// [`SimulationResponse::Cancelled`] at its next batch boundary. Returns
    /// `None` if the worker thread is gone.
    pub fn wait(
        &self,
        timeout: Option<Duration>,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Option<SimulationResponse> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut last_reported = None;

        loop {
            match self.response_rx.recv_timeout(POLL_INTERVAL) {
                Ok(response) => return Some(response),
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let progress = self.progress();
            if progress.1 > 0 && last_reported != Some(progress) {
                on_progress(progress.0, progress.1);
                last_reported = Some(progress);
            }

            if deadline.is_some_and(|d| Instant::now() >= d) && !self.is_cancelled() {
                tracing::warn!(
                    completed = progress.0,
                    total = progress.1,
                    "time limit reached, cancelling simulation"
                );
                self.cancel();
            }
        }
    }

    /// Shutdown the worker thread
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(SimulationRequest::Shutdown);
    }
}

impl Default for SimulationWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.cancel();
        self.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Shared state for the background worker thread.
struct WorkerContext {
    response_tx: Sender<SimulationResponse>,
    control: RunControl,
}

impl WorkerContext {
    fn run(&self, request_rx: Receiver<SimulationRequest>) {
        while let Ok(request) = request_rx.recv() {
            match request {
                SimulationRequest::Shutdown => break,

                SimulationRequest::Run { params, config } => {
                    tracing::info!(
                        years = params.years,
                        trials = config.trials,
                        seed = ?config.seed,
                        "Starting simulation"
                    );

                    let response = match accrue_core::run(&params, &config, &self.control) {
                        Ok(result) => SimulationResponse::Complete(Box::new(result)),
                        Err(SimulationError::Cancelled) => SimulationResponse::Cancelled,
                        Err(e) => SimulationResponse::Failed(e),
                    };
                    let _ = self.response_tx.send(response);
                }
            }
        }
    }
}
