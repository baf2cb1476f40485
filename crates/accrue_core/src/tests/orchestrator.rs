//! Tests for run orchestration
//!
//! These tests verify:
//! - Validation failures come back before any work, in rule order
//! - Phase notifications for each path
//! - Progress reporting and cancellation through an observer
//! - RunControl driving a run from another thread

use super::Recorder;
use crate::control::{RunControl, SimulationPhase};
use crate::error::{SimulationError, ValidationError};
use crate::model::{
    MonteCarloConfig, ParameterKind, RangedParameter, SimulationParameters, SimulationPath,
};
use crate::simulation::run;

fn plan_with_capital(capital: RangedParameter) -> SimulationParameters {
    SimulationParameters::new(capital, 1_000.0, 0.10, 10)
}

#[test]
fn test_inverted_range_rejected() {
    let params = plan_with_capital(RangedParameter::ranged(12_000.0, 10_000.0, 8_000.0));
    let recorder = Recorder::default();
    let err = run(&params, &MonteCarloConfig::default(), &recorder).unwrap_err();

    assert!(err.is_validation());
    assert_eq!(
        err,
        SimulationError::Validation(ValidationError::InvertedRange {
            parameter: ParameterKind::Capital,
            min: 12_000.0,
            max: 8_000.0,
        })
    );
    assert_eq!(
        *recorder.phases.borrow(),
        vec![SimulationPhase::Validating, SimulationPhase::Failed]
    );
    assert!(recorder.progress.borrow().is_empty());
}

#[test]
fn test_base_below_range_rejected() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 5_000.0, 12_000.0));
    let err = run(&params, &MonteCarloConfig::default(), &Recorder::default()).unwrap_err();
    assert_eq!(
        err,
        SimulationError::Validation(ValidationError::OutOfRangeDeterministic {
            parameter: ParameterKind::Capital,
            min: 8_000.0,
            base: 5_000.0,
            max: 12_000.0,
        })
    );
}

#[test]
fn test_missing_max_rejected() {
    let params = plan_with_capital(RangedParameter {
        min: Some(8_000.0),
        base: 10_000.0,
        max: None,
    });
    let err = run(&params, &MonteCarloConfig::default(), &Recorder::default()).unwrap_err();
    assert_eq!(
        err,
        SimulationError::Validation(ValidationError::PartialRangeFill {
            parameter: ParameterKind::Capital
        })
    );
}

#[test]
fn test_trial_count_checked_on_monte_carlo_path() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let config = MonteCarloConfig::default().with_trials(50);
    let err = run(&params, &config, &Recorder::default()).unwrap_err();
    assert_eq!(
        err,
        SimulationError::Validation(ValidationError::InvalidTrialCount {
            trials: 50,
            min: 100,
            max: 50_000,
        })
    );
}

#[test]
fn test_deterministic_phases() {
    let params = SimulationParameters::new(10_000.0, 1_000.0, 0.10, 10);
    let recorder = Recorder::default();
    let result = run(&params, &MonteCarloConfig::default(), &recorder).unwrap();

    assert_eq!(result.path, SimulationPath::DeterministicOnly);
    assert_eq!(
        *recorder.phases.borrow(),
        vec![
            SimulationPhase::Validating,
            SimulationPhase::DeterministicOnly,
            SimulationPhase::Completed
        ]
    );
    assert!(recorder.progress.borrow().is_empty());
}

#[test]
fn test_monte_carlo_progress() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let config = MonteCarloConfig {
        batch_size: 700,
        ..MonteCarloConfig::default().with_trials(3_000).with_seed(1)
    };
    let recorder = Recorder::default();
    run(&params, &config, &recorder).unwrap();

    assert_eq!(
        *recorder.phases.borrow(),
        vec![
            SimulationPhase::Validating,
            SimulationPhase::MonteCarlo,
            SimulationPhase::Completed
        ]
    );

    let progress = recorder.progress.borrow();
    assert_eq!(progress.first(), Some(&(0, 3_000)));
    assert_eq!(progress.last(), Some(&(3_000, 3_000)));
    assert!(progress.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(progress.iter().all(|(_, total)| *total == 3_000));
    assert_eq!(progress.len(), 1 + 5);
}

#[test]
fn test_cancel_before_first_batch() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let recorder = Recorder {
        cancel: true,
        ..Default::default()
    };
    let err = run(&params, &MonteCarloConfig::default().with_seed(1), &recorder).unwrap_err();

    assert_eq!(err, SimulationError::Cancelled);
    assert!(!err.is_validation());
    assert_eq!(
        recorder.phases.borrow().last(),
        Some(&SimulationPhase::Cancelled)
    );
    assert_eq!(*recorder.progress.borrow(), vec![(0, 5_000)]);
}

#[test]
fn test_cancel_does_not_affect_deterministic_path() {
    let params = SimulationParameters::new(10_000.0, 1_000.0, 0.10, 10);
    let recorder = Recorder {
        cancel: true,
        ..Default::default()
    };
    assert!(run(&params, &MonteCarloConfig::default(), &recorder).is_ok());
}

#[test]
fn test_run_control_from_worker_thread() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let config = MonteCarloConfig::default().with_trials(2_000).with_seed(9);
    let control = RunControl::new();

    let worker = {
        let control = control.clone();
        std::thread::spawn(move || run(&params, &config, &control))
    };
    let result = worker.join().unwrap().unwrap();

    assert_eq!(result.trials, 2_000);
    assert_eq!(control.completed(), 2_000);
    assert_eq!(control.total(), 2_000);
    assert_eq!(control.fraction(), 1.0);
    assert_eq!(control.phase(), SimulationPhase::Completed);
}

#[test]
fn test_run_control_cancelled_up_front() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let control = RunControl::new();
    control.cancel();

    let err = run(&params, &MonteCarloConfig::default(), &control).unwrap_err();
    assert_eq!(err, SimulationError::Cancelled);
    assert_eq!(control.phase(), SimulationPhase::Cancelled);
    assert!(control.phase().is_terminal());
}

#[test]
fn test_runs_share_no_state() {
    let params = plan_with_capital(RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0));
    let config = MonteCarloConfig::default().with_trials(500).with_seed(3);
    let control = RunControl::new();

    let first = run(&params, &config, &control).unwrap();
    control.reset();
    let second = run(&params, &config, &control).unwrap();
    assert_eq!(first, second);
}
