use std::fmt;

use crate::model::ParameterKind;

/// Input problems detected before any simulation work starts.
///
/// Variants are mutually exclusive: validation stops at the first rule that
/// fails (see [`crate::validation::validate`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Exactly one of `min`/`max` was provided.
    PartialRangeFill { parameter: ParameterKind },
    /// Both bounds provided but `min > max`.
    InvertedRange {
        parameter: ParameterKind,
        min: f64,
        max: f64,
    },
    /// The deterministic `base` lies outside `[min, max]`.
    OutOfRangeDeterministic {
        parameter: ParameterKind,
        min: f64,
        base: f64,
        max: f64,
    },
    /// Horizon is zero or longer than [`crate::model::MAX_YEARS`].
    InvalidHorizon { years: u32 },
    /// A parameter value, goal, event amount or the risk-free rate is NaN or
    /// infinite.
    NonFiniteInput { field: &'static str },
    /// A dated cash event was given but the parameters carry no start date.
    MissingStartDate,
    /// Trial count outside the configured bounds.
    InvalidTrialCount { trials: usize, min: usize, max: usize },
    /// A percentile outside `[0, 1]`, or a confidence band with `lower >= upper`.
    InvalidPercentile { value: f64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::PartialRangeFill { parameter } => {
                write!(f, "{parameter}: min and max must be provided together")
            }
            ValidationError::InvertedRange {
                parameter,
                min,
                max,
            } => write!(f, "{parameter}: min ({min}) is greater than max ({max})"),
            ValidationError::OutOfRangeDeterministic {
                parameter,
                min,
                base,
                max,
            } => write!(f, "{parameter}: base ({base}) is outside [{min}, {max}]"),
            ValidationError::InvalidHorizon { years } => {
                write!(f, "horizon of {years} years is not supported")
            }
            ValidationError::NonFiniteInput { field } => write!(f, "{field} must be finite"),
            ValidationError::MissingStartDate => {
                write!(f, "dated cash events require a start date")
            }
            ValidationError::InvalidTrialCount { trials, min, max } => {
                write!(f, "trial count {trials} is outside [{min}, {max}]")
            }
            ValidationError::InvalidPercentile { value } => {
                write!(f, "percentile {value} is not a valid fraction")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every way a simulation run can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Bad input, reported before any work begins.
    Validation(ValidationError),
    /// A balance became NaN or infinite at the given month.
    Overflow { month: u32 },
    /// A sampling distribution could not be built from the parameter range.
    InvalidDistribution {
        parameter: ParameterKind,
        reason: &'static str,
    },
    /// Run aborted through the observer's cancellation flag.
    Cancelled,
}

impl SimulationError {
    /// `true` for bad-input errors, `false` for failures during execution.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SimulationError::Validation(_))
    }
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Validation(e) => write!(f, "invalid input: {e}"),
            SimulationError::Overflow { month } => {
                write!(f, "balance is no longer finite at month {month}")
            }
            SimulationError::InvalidDistribution { parameter, reason } => {
                write!(f, "cannot sample {parameter}: {reason}")
            }
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SimulationError {
    fn from(e: ValidationError) -> Self {
        SimulationError::Validation(e)
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
