//! Map points of the final-balance distribution back to concrete trials.

use crate::model::{Scenario, ScenarioTarget};
use crate::monte_carlo::TrialSamples;
use crate::stats::{histogram_mode, mean, percentile_sorted, sort_values};

/// Index of the value closest to `target`; the lowest index wins ties.
fn closest_trial(values: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (trial, value) in values.iter().enumerate() {
        let distance = (value - target).abs();
        if distance < best_distance {
            best = trial;
            best_distance = distance;
        }
    }
    best
}

/// One scenario per requested target, in request order.
///
/// Each scenario carries the exact sampled inputs of the trial whose final
/// balance lies closest to the target value (a percentile, the mean or the
/// histogram mode), so re-projecting them gives back `final_balance`.
/// Returns nothing for an empty sample.
#[must_use]
pub fn locate(
    final_balances: &[f64],
    samples: &TrialSamples,
    targets: &[ScenarioTarget],
) -> Vec<Scenario> {
    if final_balances.is_empty() {
        return Vec::new();
    }

    let mut sorted = final_balances.to_vec();
    sort_values(&mut sorted);

    targets
        .iter()
        .map(|&target| {
            let value = match target {
                ScenarioTarget::Percentile(p) => percentile_sorted(&sorted, p),
                ScenarioTarget::Mean => mean(&sorted),
                ScenarioTarget::Mode => histogram_mode(&sorted),
            };
            let trial = closest_trial(final_balances, value);
            let inputs = samples.inputs(trial);
            Scenario {
                label: target.label(),
                target,
                trial,
                capital: inputs.capital,
                contribution: inputs.contribution,
                rate: inputs.rate,
                final_balance: final_balances[trial],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> TrialSamples {
        TrialSamples {
            capital: (0..n).map(|i| i as f64).collect(),
            contribution: vec![10.0; n],
            rate: vec![0.05; n],
        }
    }

    fn percentiles(ps: &[f64]) -> Vec<ScenarioTarget> {
        ps.iter().map(|&p| ScenarioTarget::Percentile(p)).collect()
    }

    #[test]
    fn test_picks_nearest_trial() {
        let finals = [50.0, 10.0, 30.0, 20.0, 40.0];
        let scenarios = locate(&finals, &samples(5), &percentiles(&[0.0, 0.5, 1.0]));

        let trials: Vec<_> = scenarios.iter().map(|s| s.trial).collect();
        assert_eq!(trials, vec![1, 2, 0]);
        assert_eq!(scenarios[1].label, "P50");
        assert_eq!(scenarios[1].final_balance, 30.0);
        assert_eq!(scenarios[1].capital, 2.0);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        // median of [10, 20] is 15: both equally close
        let finals = [20.0, 10.0];
        let scenarios = locate(&finals, &samples(2), &percentiles(&[0.5]));
        assert_eq!(scenarios[0].trial, 0);

        let finals = [7.0, 7.0, 7.0];
        let scenarios = locate(&finals, &samples(3), &percentiles(&[0.25, 0.75]));
        assert!(scenarios.iter().all(|s| s.trial == 0));
    }

    #[test]
    fn test_mean_and_mode_targets() {
        // mean 22; three bins over [11, 40] tie at two, the lowest centers near 15.8
        let finals = [40.0, 12.0, 21.0, 11.0, 26.0];
        let scenarios = locate(
            &finals,
            &samples(5),
            &[ScenarioTarget::Mean, ScenarioTarget::Mode],
        );

        assert_eq!(scenarios[0].label, "Mean");
        assert_eq!(scenarios[0].trial, 2);
        assert_eq!(scenarios[0].target, ScenarioTarget::Mean);
        assert_eq!(scenarios[1].label, "Mode");
        assert_eq!(scenarios[1].trial, 1);
        assert_eq!(scenarios[1].final_balance, 12.0);
    }

    #[test]
    fn test_empty_sample() {
        assert!(locate(&[], &TrialSamples::default(), &percentiles(&[0.5])).is_empty());
    }
}
