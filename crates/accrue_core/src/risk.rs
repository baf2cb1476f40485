//! Risk figures over the final balances of a Monte Carlo run.

use crate::model::RiskMetrics;
use crate::stats::{mean, percentile_sorted, sort_values, std_dev};

/// Tail used for VaR and CVaR.
const TAIL: f64 = 0.05;

/// Compute risk metrics. `insolvent` is indexed like `final_balances`;
/// losses are measured against `base_capital`.
///
/// The Sharpe ratio compares the mean final balance with one year of
/// `risk_free_rate` growth on the base capital.
#[must_use]
pub fn compute(
    final_balances: &[f64],
    insolvent: &[bool],
    base_capital: f64,
    goal: Option<f64>,
    risk_free_rate: f64,
) -> RiskMetrics {
    let n = final_balances.len();
    if n == 0 {
        return RiskMetrics {
            success_probability: goal.map(|_| 0.0),
            ruin_probability: 0.0,
            insolvency_probability: 0.0,
            value_at_risk_95: 0.0,
            conditional_value_at_risk_95: 0.0,
            coefficient_of_variation: 0.0,
            volatility: 0.0,
            risk_return_ratio: 0.0,
            sharpe_ratio: 0.0,
        };
    }
    let share = |count: usize| count as f64 / n as f64;

    let mut sorted = final_balances.to_vec();
    sort_values(&mut sorted);

    let success_probability =
        goal.map(|goal| share(final_balances.iter().filter(|b| **b >= goal).count()));
    let ruin_probability = share(final_balances.iter().filter(|b| **b <= base_capital).count());
    let insolvency_probability = share(insolvent.iter().filter(|i| **i).count());

    let var_threshold = percentile_sorted(&sorted, TAIL);
    let tail_len = ((n as f64 * TAIL).ceil() as usize).clamp(1, n);
    let tail_mean = mean(&sorted[..tail_len]);

    let m = mean(&sorted);
    let volatility = std_dev(&sorted, m);
    let coefficient_of_variation = if m.abs() > f64::EPSILON {
        volatility / m
    } else {
        0.0
    };

    let value_at_risk_95 = (base_capital - var_threshold).max(0.0);
    let gain = m - base_capital;
    let risk_return_ratio = if gain > 0.0 {
        value_at_risk_95 / gain
    } else {
        0.0
    };
    let sharpe_ratio = if volatility > 0.0 {
        (m - base_capital * (1.0 + risk_free_rate)) / volatility
    } else {
        0.0
    };

    RiskMetrics {
        success_probability,
        ruin_probability,
        insolvency_probability,
        value_at_risk_95,
        conditional_value_at_risk_95: (base_capital - tail_mean).max(0.0),
        coefficient_of_variation,
        volatility,
        risk_return_ratio,
        sharpe_ratio,
    }
}
