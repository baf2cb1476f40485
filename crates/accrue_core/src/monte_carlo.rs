//! Vectorized Monte Carlo engine
//!
//! Trials are sampled up front, then simulated in batches. Inside a batch the
//! trials are cut into lanes of [`LANE_WIDTH`]; each lane advances all of its
//! trajectories in lock-step, one slice update per month. Lanes are spread over
//! the rayon pool when the `parallel` feature is enabled.
//!
//! Between batches the observer is asked whether to stop and told how far the
//! run got. A cancelled run returns [`SimulationError::Cancelled`] and nothing
//! else.

use std::ops::Range;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal, Triangular, Uniform};
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::control::RunObserver;
use crate::error::{Result, SimulationError};
use crate::model::{
    CashSchedule, ConfidenceBand, GrowthInputs, MonteCarloConfig, ParameterKind,
    RangedParameter, SamplingDistribution, SimulationParameters,
};
use crate::projection::{advance_month, growth_factor};
use crate::stats::{SampleStats, sort_values};

/// Trials advanced together as one vector.
pub const LANE_WIDTH: usize = 256;

/// The sampled inputs of every trial, indexed by trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialSamples {
    pub capital: Vec<f64>,
    pub contribution: Vec<f64>,
    pub rate: Vec<f64>,
}

impl TrialSamples {
    #[must_use]
    pub fn len(&self) -> usize {
        self.capital.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capital.is_empty()
    }

    /// Exact inputs of one trial.
    #[must_use]
    pub fn inputs(&self, trial: usize) -> GrowthInputs {
        GrowthInputs::new(
            self.capital[trial],
            self.contribution[trial],
            self.rate[trial],
        )
    }
}

/// Draw `n` values for one parameter. Parameters without a spread are held at
/// `base`.
fn sample_parameter<R: Rng + ?Sized>(
    kind: ParameterKind,
    param: &RangedParameter,
    n: usize,
    distribution: SamplingDistribution,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let Some((min, max)) = param.spread() else {
        return Ok(vec![param.base; n]);
    };

    let invalid = |reason: &'static str| SimulationError::InvalidDistribution {
        parameter: kind,
        reason,
    };

    let samples = match distribution {
        SamplingDistribution::Normal => {
            let normal = Normal::new(param.mean(), param.std_dev())
                .map_err(|_| invalid("standard deviation must be finite"))?;
            (0..n)
                .map(|_| normal.sample(rng).clamp(min, max))
                .collect()
        }
        SamplingDistribution::Uniform => {
            let uniform =
                Uniform::new_inclusive(min, max).map_err(|_| invalid("empty or infinite range"))?;
            (0..n).map(|_| uniform.sample(rng)).collect()
        }
        SamplingDistribution::Triangular => {
            let triangular = Triangular::new(min, max, param.base.clamp(min, max))
                .map_err(|_| invalid("mode must lie within the range"))?;
            (0..n).map(|_| triangular.sample(rng)).collect()
        }
    };
    Ok(samples)
}

/// Sample capital, contribution and rate independently for `config.trials`
/// trials. Each parameter draws from its own stream derived from `seed`, so
/// the samples do not depend on batch size or thread count.
pub fn sample_trials(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    seed: u64,
) -> Result<TrialSamples> {
    let mut master = SmallRng::seed_from_u64(seed);
    let mut draw = |kind: ParameterKind| {
        let mut rng = SmallRng::seed_from_u64(master.next_u64());
        sample_parameter(
            kind,
            params.parameter(kind),
            config.trials,
            config.distribution,
            &mut rng,
        )
    };

    Ok(TrialSamples {
        capital: draw(ParameterKind::Capital)?,
        contribution: draw(ParameterKind::Contribution)?,
        rate: draw(ParameterKind::Rate)?,
    })
}

/// Everything a finished Monte Carlo run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloOutcome {
    pub samples: TrialSamples,
    /// Year-major balances: `yearly[year][trial]`, years `0..=horizon`.
    pub yearly: Vec<Vec<f64>>,
    pub insolvent: Vec<bool>,
    pub seed: u64,
}

impl MonteCarloOutcome {
    #[must_use]
    pub fn trials(&self) -> usize {
        self.samples.len()
    }

    /// Balance of every trial at the horizon.
    #[must_use]
    pub fn final_balances(&self) -> &[f64] {
        self.yearly.last().map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn insolvent_trials(&self) -> usize {
        self.insolvent.iter().filter(|i| **i).count()
    }

    /// Per-year statistics across trials.
    #[must_use]
    pub fn aggregate(&self, band: ConfidenceBand) -> Vec<SampleStats> {
        self.yearly
            .iter()
            .map(|balances| {
                let mut sorted = balances.clone();
                sort_values(&mut sorted);
                SampleStats::from_sorted(&sorted, band.lower, band.upper)
            })
            .collect()
    }
}

/// One lane's view of the batch.
struct Lane<'a> {
    start: usize,
    capital: &'a [f64],
    contribution: &'a [f64],
    growth: &'a [f64],
}

struct LaneOutput {
    start: usize,
    /// Year-major within the lane: `(years + 1) * len` values.
    yearly: Vec<f64>,
    insolvent: Vec<bool>,
}

fn simulate_lane(lane: Lane<'_>, years: u32, schedule: &CashSchedule) -> Result<LaneOutput> {
    let len = lane.capital.len();
    let mut balances = lane.capital.to_vec();
    let mut insolvent = vec![false; len];
    let mut yearly = Vec::with_capacity((years as usize + 1) * len);
    yearly.extend_from_slice(&balances);

    for month in 1..=years * 12 {
        let flows = schedule.at(month);
        let mut finite = true;
        for (((balance, growth), contribution), dead) in balances
            .iter_mut()
            .zip(lane.growth)
            .zip(lane.contribution)
            .zip(insolvent.iter_mut())
        {
            *balance = advance_month(*balance, *growth, *contribution, flows, dead);
            finite &= balance.is_finite();
        }
        if !finite {
            return Err(SimulationError::Overflow { month });
        }
        if month % 12 == 0 {
            yearly.extend_from_slice(&balances);
        }
    }

    Ok(LaneOutput {
        start: lane.start,
        yearly,
        insolvent,
    })
}

fn simulate_batch(
    samples: &TrialSamples,
    growth: &[f64],
    batch: Range<usize>,
    years: u32,
    schedule: &CashSchedule,
    parallel: bool,
) -> Result<Vec<LaneOutput>> {
    let lanes: Vec<Lane<'_>> = batch
        .clone()
        .step_by(LANE_WIDTH)
        .map(|start| {
            let end = (start + LANE_WIDTH).min(batch.end);
            Lane {
                start,
                capital: &samples.capital[start..end],
                contribution: &samples.contribution[start..end],
                growth: &growth[start..end],
            }
        })
        .collect();

    #[cfg(feature = "parallel")]
    if parallel && lanes.len() > 1 {
        return lanes
            .into_par_iter()
            .map(|lane| simulate_lane(lane, years, schedule))
            .collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    lanes
        .into_iter()
        .map(|lane| simulate_lane(lane, years, schedule))
        .collect()
}

/// Simulate every trial and keep the yearly balance matrix.
///
/// `observer` receives `(0, N)` before the first batch and `(completed, N)`
/// after every batch; it is polled for cancellation before each batch.
pub fn run(
    params: &SimulationParameters,
    config: &MonteCarloConfig,
    schedule: &CashSchedule,
    observer: &dyn RunObserver,
) -> Result<MonteCarloOutcome> {
    let started = Instant::now();
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let trials = config.trials;
    let years = params.years;
    let batch_size = config.effective_batch_size();

    tracing::debug!(trials, years, seed, batch_size, "starting monte carlo run");

    let samples = sample_trials(params, config, seed)?;
    let growth: Vec<f64> = samples
        .rate
        .iter()
        .map(|rate| growth_factor(*rate, config.convention))
        .collect();

    let mut yearly = vec![vec![0.0; trials]; years as usize + 1];
    let mut insolvent = vec![false; trials];

    let mut completed = 0;
    observer.on_progress(completed, trials);
    while completed < trials {
        if observer.is_cancelled() {
            tracing::debug!(completed, trials, "monte carlo run cancelled");
            return Err(SimulationError::Cancelled);
        }

        let end = (completed + batch_size).min(trials);
        let lanes = simulate_batch(
            &samples,
            &growth,
            completed..end,
            years,
            schedule,
            config.parallel,
        )?;

        for lane in lanes {
            let len = lane.insolvent.len();
            let range = lane.start..lane.start + len;
            for (year, row) in yearly.iter_mut().enumerate() {
                row[range.clone()].copy_from_slice(&lane.yearly[year * len..(year + 1) * len]);
            }
            insolvent[range].copy_from_slice(&lane.insolvent);
        }

        completed = end;
        observer.on_progress(completed, trials);
    }

    tracing::debug!(
        trials,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "monte carlo run finished"
    );

    Ok(MonteCarloOutcome {
        samples,
        yearly,
        insolvent,
        seed,
    })
}
