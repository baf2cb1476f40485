//! Compound-growth projection library
//!
//! This crate projects a periodic-contribution investment under compound
//! interest and measures how uncertain inputs spread the outcome.
//! It supports:
//! - Deterministic monthly projection with one-off deposits and withdrawals
//! - Vectorized Monte Carlo sampling of capital, contribution and rate
//! - Per-year distribution statistics and a confidence band
//! - Mapping percentiles back to reproducible input scenarios
//! - Sensitivity of the final balance to each input
//! - Risk metrics (goal success, ruin, VaR/CVaR)
//!
//! # Example
//!
//! ```ignore
//! use accrue_core::model::{MonteCarloConfig, RangedParameter, SimulationParameters};
//!
//! let params = SimulationParameters::new(
//!     RangedParameter::ranged(8_000.0, 10_000.0, 12_000.0),
//!     1_000.0,
//!     RangedParameter::ranged(0.06, 0.10, 0.14),
//!     10,
//! )
//! .with_goal(250_000.0);
//!
//! let result = accrue_core::simulation::simulate(&params, &MonteCarloConfig::default())?;
//! println!("median after 10y: {}", result.final_row().unwrap().median);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod control;
pub mod error;
pub mod monte_carlo;
pub mod projection;
pub mod risk;
pub mod scenario;
pub mod sensitivity;
pub mod simulation;
pub mod stats;
pub mod validation;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use control::{NoopObserver, RunControl, RunObserver, SimulationPhase};
pub use error::{SimulationError, ValidationError};
pub use simulation::{run, simulate};
