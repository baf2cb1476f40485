//! Extraordinary deposits and withdrawals.
//!
//! Events are folded into a per-month schedule before the recurrence runs. The
//! recurrence step `n` (1-based) covers the `n`-th calendar month after the
//! start, so an event dated in the start month lands on step 1.

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest stored event description.
pub const MAX_DESCRIPTION_LEN: usize = 35;

/// When an event happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTiming {
    /// Recurrence step, 1-based.
    Month(u32),
    /// Calendar date, resolved against the parameters' start date.
    Date(Date),
}

/// A one-off deposit and/or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashEvent {
    pub at: EventTiming,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deposit: f64,
    #[serde(default)]
    pub withdrawal: f64,
}

impl CashEvent {
    #[must_use]
    pub fn deposit(at: EventTiming, amount: f64) -> Self {
        Self {
            at,
            description: String::new(),
            deposit: amount.max(0.0),
            withdrawal: 0.0,
        }
    }

    #[must_use]
    pub fn withdrawal(at: EventTiming, amount: f64) -> Self {
        Self {
            at,
            description: String::new(),
            deposit: 0.0,
            withdrawal: amount.max(0.0),
        }
    }

    #[must_use]
    pub fn described(mut self, description: &str) -> Self {
        self.description = description.chars().take(MAX_DESCRIPTION_LEN).collect();
        self
    }

    /// Positive for inflows, negative for outflows.
    #[must_use]
    pub fn net_amount(&self) -> f64 {
        self.deposit - self.withdrawal
    }

    /// Recurrence step this event applies to, if it can be resolved.
    fn step(&self, start: Option<Date>) -> Result<Option<u32>, ValidationError> {
        match self.at {
            EventTiming::Month(m) => Ok(Some(m)),
            EventTiming::Date(date) => {
                let start = start.ok_or(ValidationError::MissingStartDate)?;
                let diff = (i32::from(date.year()) - i32::from(start.year())) * 12
                    + (i32::from(date.month()) - i32::from(start.month()));
                Ok(u32::try_from(diff).ok().map(|d| d + 1))
            }
        }
    }
}

/// Deposits and withdrawals consolidated by recurrence step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthFlows {
    pub deposit: f64,
    pub withdrawal: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CashSchedule {
    flows: FxHashMap<u32, MonthFlows>,
}

impl CashSchedule {
    /// Consolidate events into steps `1..=total_months`; events outside the
    /// horizon are dropped. Amounts are taken as magnitudes.
    pub fn build(
        events: &[CashEvent],
        start: Option<Date>,
        total_months: u32,
    ) -> Result<Self, ValidationError> {
        let mut flows: FxHashMap<u32, MonthFlows> = FxHashMap::default();
        for event in events {
            let Some(step) = event.step(start)? else {
                continue;
            };
            if step == 0 || step > total_months {
                continue;
            }
            let entry = flows.entry(step).or_default();
            entry.deposit += event.deposit.max(0.0);
            entry.withdrawal += event.withdrawal.max(0.0);
        }
        Ok(Self { flows })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn at(&self, step: u32) -> Option<MonthFlows> {
        if self.flows.is_empty() {
            return None;
        }
        self.flows.get(&step).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Net external flow through step `through` inclusive.
    #[must_use]
    pub fn net_through(&self, through: u32) -> f64 {
        self.flows
            .iter()
            .filter(|(step, _)| **step <= through)
            .map(|(_, f)| f.deposit - f.withdrawal)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_resolution() {
        let start = jiff::civil::date(2025, 3, 10);
        let events = vec![
            CashEvent::deposit(EventTiming::Date(jiff::civil::date(2025, 3, 28)), 100.0),
            CashEvent::deposit(EventTiming::Date(jiff::civil::date(2026, 2, 1)), 50.0),
            CashEvent::withdrawal(EventTiming::Date(jiff::civil::date(2026, 2, 20)), 30.0),
            // before start
            CashEvent::deposit(EventTiming::Date(jiff::civil::date(2024, 12, 1)), 999.0),
        ];

        let schedule = CashSchedule::build(&events, Some(start), 24).unwrap();

        assert_eq!(
            schedule.at(1),
            Some(MonthFlows {
                deposit: 100.0,
                withdrawal: 0.0
            })
        );
        assert_eq!(
            schedule.at(12),
            Some(MonthFlows {
                deposit: 50.0,
                withdrawal: 30.0
            })
        );
        assert_eq!(schedule.net_through(24), 120.0);
    }

    #[test]
    fn test_events_past_horizon_are_dropped() {
        let events = vec![
            CashEvent::deposit(EventTiming::Month(0), 1.0),
            CashEvent::deposit(EventTiming::Month(12), 2.0),
            CashEvent::deposit(EventTiming::Month(13), 4.0),
        ];
        let schedule = CashSchedule::build(&events, None, 12).unwrap();
        assert_eq!(schedule.net_through(100), 2.0);
    }

    #[test]
    fn test_dated_event_requires_start() {
        let events = vec![CashEvent::deposit(
            EventTiming::Date(jiff::civil::date(2025, 1, 1)),
            1.0,
        )];
        assert_eq!(
            CashSchedule::build(&events, None, 12).unwrap_err(),
            ValidationError::MissingStartDate
        );
    }

    #[test]
    fn test_description_truncated() {
        let e = CashEvent::deposit(EventTiming::Month(1), 1.0)
            .described("a description that is clearly longer than allowed");
        assert_eq!(e.description.chars().count(), MAX_DESCRIPTION_LEN);
    }
}
