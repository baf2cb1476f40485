//! Deterministic compound-growth projection
//!
//! `M(0) = C`, `M(n) = M(n-1) * (1 + i) + PMT`, followed by that month's cash
//! events. The Monte Carlo engine advances its trials with [`advance_month`]
//! as well, so a trial re-projected here reproduces its balance bit for bit.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::model::{CashSchedule, GrowthInputs, MonthFlows, RateConvention};

/// Annual-rate search interval for [`implied_rate`].
pub const IMPLIED_RATE_BOUNDS: (f64, f64) = (-0.30, 0.50);
const IMPLIED_RATE_MAX_ITERATIONS: usize = 100;

/// One month of the recurrence for a single trajectory.
///
/// Once a withdrawal exceeds the balance the trajectory is insolvent: the
/// balance is zeroed and stays there.
#[inline(always)]
pub(crate) fn advance_month(
    balance: f64,
    growth: f64,
    contribution: f64,
    flows: Option<MonthFlows>,
    insolvent: &mut bool,
) -> f64 {
    if *insolvent {
        return 0.0;
    }
    let mut next = balance * growth + contribution;
    if let Some(flows) = flows {
        next += flows.deposit;
        if flows.withdrawal > 0.0 {
            if next < flows.withdrawal {
                *insolvent = true;
                return 0.0;
            }
            next -= flows.withdrawal;
        }
    }
    next
}

/// Monthly growth factor `1 + i`.
#[inline]
#[must_use]
pub fn growth_factor(annual_rate: f64, convention: RateConvention) -> f64 {
    1.0 + convention.monthly_rate(annual_rate)
}

/// Monthly balances of one deterministic run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub inputs: GrowthInputs,
    pub years: u32,
    /// Balance at every month, `12 * years + 1` entries starting at month 0.
    pub balances: Vec<f64>,
    /// Month of the first failed withdrawal, if any.
    pub insolvent_at: Option<u32>,
}

impl Projection {
    #[must_use]
    pub fn final_balance(&self) -> f64 {
        self.balances.last().copied().unwrap_or(self.inputs.capital)
    }

    #[must_use]
    pub fn balance_at_year(&self, year: u32) -> Option<f64> {
        self.balances.get(year as usize * 12).copied()
    }

    /// `(year, balance)` for years `0..=years`.
    pub fn yearly(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        (0..=self.years).filter_map(|y| self.balance_at_year(y).map(|b| (y, b)))
    }

    /// Capital plus contributions and net event flows through the end of `year`.
    #[must_use]
    pub fn invested_at_year(&self, year: u32, schedule: &CashSchedule) -> f64 {
        let months = year * 12;
        self.inputs.capital
            + self.inputs.contribution * f64::from(months)
            + schedule.net_through(months)
    }

    /// First month at which the balance reaches `goal`, in fractional years.
    #[must_use]
    pub fn years_to_reach(&self, goal: f64) -> Option<f64> {
        self.balances
            .iter()
            .position(|b| *b >= goal)
            .map(|month| month as f64 / 12.0)
    }
}

/// Run the recurrence for `years` with the given cash events.
pub fn project(
    inputs: GrowthInputs,
    years: u32,
    convention: RateConvention,
    schedule: &CashSchedule,
) -> Result<Projection> {
    let total_months = years * 12;
    let growth = growth_factor(inputs.rate, convention);

    let mut balances = Vec::with_capacity(total_months as usize + 1);
    let mut balance = inputs.capital;
    let mut insolvent = false;
    let mut insolvent_at = None;
    if !balance.is_finite() {
        return Err(SimulationError::Overflow { month: 0 });
    }
    balances.push(balance);

    for month in 1..=total_months {
        balance = advance_month(
            balance,
            growth,
            inputs.contribution,
            schedule.at(month),
            &mut insolvent,
        );
        if !balance.is_finite() {
            return Err(SimulationError::Overflow { month });
        }
        if insolvent && insolvent_at.is_none() {
            insolvent_at = Some(month);
        }
        balances.push(balance);
    }

    Ok(Projection {
        inputs,
        years,
        balances,
        insolvent_at,
    })
}

/// Final balance without cash events.
pub fn final_balance(inputs: GrowthInputs, years: u32, convention: RateConvention) -> Result<f64> {
    let total_months = years * 12;
    let growth = growth_factor(inputs.rate, convention);
    let mut balance = inputs.capital;
    let mut insolvent = false;
    for month in 1..=total_months {
        balance = advance_month(balance, growth, inputs.contribution, None, &mut insolvent);
        if !balance.is_finite() {
            return Err(SimulationError::Overflow { month });
        }
    }
    Ok(balance)
}

/// Analytic balance: `C (1+i)^n + PMT ((1+i)^n - 1) / i`, or `C + PMT n` at `i = 0`.
#[must_use]
pub fn closed_form_balance(inputs: GrowthInputs, years: u32, convention: RateConvention) -> f64 {
    let n = (years * 12) as i32;
    let i = convention.monthly_rate(inputs.rate);
    let factor = (1.0 + i).powi(n);
    if i == 0.0 {
        return inputs.capital + inputs.contribution * f64::from(n);
    }
    inputs.capital * factor + inputs.contribution * (factor - 1.0) / i
}

/// Result of [`implied_rate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedRate {
    pub rate: f64,
    /// Balance the returned rate produces.
    pub balance: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Annual rate that grows `capital` and `contribution` into `target` over
/// `years`, found by bisection over [`IMPLIED_RATE_BOUNDS`].
///
/// Assumes the balance rises with the rate (non-negative capital and
/// contribution). When the target lies outside what the interval can reach,
/// the nearest endpoint is returned with `converged == false`.
pub fn implied_rate(
    target: f64,
    capital: f64,
    contribution: f64,
    years: u32,
    convention: RateConvention,
) -> Result<ImpliedRate> {
    let inputs = GrowthInputs::new(capital, contribution, 0.0);
    let eval = |rate: f64| final_balance(inputs.with_rate(rate), years, convention);
    let tolerance = (target.abs() * 1e-10).max(1e-6);

    let (mut low, mut high) = IMPLIED_RATE_BOUNDS;
    let low_balance = eval(low)?;
    if low_balance >= target {
        return Ok(ImpliedRate {
            rate: low,
            balance: low_balance,
            converged: (low_balance - target).abs() <= tolerance,
            iterations: 0,
        });
    }
    let high_balance = eval(high)?;
    if high_balance <= target {
        return Ok(ImpliedRate {
            rate: high,
            balance: high_balance,
            converged: (high_balance - target).abs() <= tolerance,
            iterations: 0,
        });
    }

    let mut iteration = 0;
    let mut mid = f64::midpoint(low, high);
    let mut balance = eval(mid)?;
    while iteration < IMPLIED_RATE_MAX_ITERATIONS && (balance - target).abs() > tolerance {
        iteration += 1;
        if balance < target {
            low = mid;
        } else {
            high = mid;
        }
        mid = f64::midpoint(low, high);
        balance = eval(mid)?;
    }

    Ok(ImpliedRate {
        rate: mid,
        balance,
        converged: (balance - target).abs() <= tolerance,
        iterations: iteration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CashEvent, EventTiming};

    fn relative_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_month_zero_and_yearly_sampling() {
        let inputs = GrowthInputs::new(1_000.0, 100.0, 0.0);
        let p = project(inputs, 2, RateConvention::Effective, &CashSchedule::empty()).unwrap();

        assert_eq!(p.balances.len(), 25);
        let yearly: Vec<_> = p.yearly().collect();
        assert_eq!(yearly, vec![(0, 1_000.0), (1, 2_200.0), (2, 3_400.0)]);
    }

    #[test]
    fn test_matches_closed_form() {
        for &(c, pmt, r, y) in &[
            (10_000.0, 1_000.0, 0.10, 10),
            (0.0, 250.0, 0.07, 30),
            (50_000.0, 0.0, 0.035, 25),
            (1_000.0, 100.0, -0.05, 15),
        ] {
            let inputs = GrowthInputs::new(c, pmt, r);
            for convention in [RateConvention::Effective, RateConvention::Nominal] {
                let simulated = final_balance(inputs, y, convention).unwrap();
                let analytic = closed_form_balance(inputs, y, convention);
                assert!(
                    relative_eq(simulated, analytic, 1e-9),
                    "{inputs:?} {convention:?}: {simulated} vs {analytic}"
                );
            }
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let inputs = GrowthInputs::new(1e300, 0.0, 1e6);
        let err = final_balance(inputs, 10, RateConvention::Effective).unwrap_err();
        assert!(matches!(err, SimulationError::Overflow { .. }));
    }

    #[test]
    fn test_rate_below_minus_one_is_an_error() {
        let inputs = GrowthInputs::new(1_000.0, 0.0, -1.5);
        let err = project(inputs, 1, RateConvention::Effective, &CashSchedule::empty()).unwrap_err();
        assert_eq!(err, SimulationError::Overflow { month: 1 });
    }

    #[test]
    fn test_events_shift_the_balance() {
        let inputs = GrowthInputs::new(1_000.0, 0.0, 0.0);
        let events = vec![
            CashEvent::deposit(EventTiming::Month(3), 500.0),
            CashEvent::withdrawal(EventTiming::Month(6), 200.0),
        ];
        let schedule = CashSchedule::build(&events, None, 12).unwrap();
        let p = project(inputs, 1, RateConvention::Effective, &schedule).unwrap();

        assert_eq!(p.balances[2], 1_000.0);
        assert_eq!(p.balances[3], 1_500.0);
        assert_eq!(p.balances[6], 1_300.0);
        assert_eq!(p.final_balance(), 1_300.0);
        assert_eq!(p.invested_at_year(1, &schedule), 1_300.0);
        assert_eq!(p.insolvent_at, None);
    }

    #[test]
    fn test_insolvency_zeroes_remaining_months() {
        let inputs = GrowthInputs::new(1_000.0, 100.0, 0.05);
        let events = vec![CashEvent::withdrawal(EventTiming::Month(4), 10_000.0)];
        let schedule = CashSchedule::build(&events, None, 24).unwrap();
        let p = project(inputs, 2, RateConvention::Effective, &schedule).unwrap();

        assert_eq!(p.insolvent_at, Some(4));
        assert!(p.balances[3] > 1_000.0);
        assert!(p.balances[4..].iter().all(|b| *b == 0.0));
    }

    #[test]
    fn test_years_to_reach() {
        let inputs = GrowthInputs::new(0.0, 100.0, 0.0);
        let p = project(inputs, 2, RateConvention::Effective, &CashSchedule::empty()).unwrap();
        assert_eq!(p.years_to_reach(1_800.0), Some(1.5));
        assert_eq!(p.years_to_reach(1e9), None);
    }

    #[test]
    fn test_implied_rate_round_trip() {
        let inputs = GrowthInputs::new(10_000.0, 500.0, 0.083);
        let target = final_balance(inputs, 12, RateConvention::Effective).unwrap();

        let found = implied_rate(target, 10_000.0, 500.0, 12, RateConvention::Effective).unwrap();

        assert!(found.converged);
        assert!((found.rate - 0.083).abs() < 1e-8, "rate {}", found.rate);
    }

    #[test]
    fn test_implied_rate_out_of_reach() {
        let found = implied_rate(1e12, 1_000.0, 10.0, 5, RateConvention::Effective).unwrap();
        assert!(!found.converged);
        assert_eq!(found.rate, IMPLIED_RATE_BOUNDS.1);
    }
}
