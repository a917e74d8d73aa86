use std::fmt;

use statrs::StatsError;

/// Invalid, missing or inconsistent configuration or design.
/// Always raised before any observation is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    ProbWithoutStat,
    MissingUnitVariable,
    UnsupportedTail(i32),
    InvalidAlpha(f64),
    DesignRowOutOfRange { name: &'static str, row: usize, nrows: usize },
    InvalidDesign(String),
    InsufficientUnits(usize),
    DimensionMismatch { data_columns: usize, design_columns: usize },
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigurationError::ProbWithoutStat => {
                write!(f, "computing p-values requires computing the statistic")
            }
            ConfigurationError::MissingUnitVariable => {
                write!(f, "the design row holding the unit of observation (uvar) must be specified")
            }
            ConfigurationError::UnsupportedTail(tail) => {
                write!(f, "unsupported tail value: {} (expected -1, 0 or 1)", tail)
            }
            ConfigurationError::InvalidAlpha(alpha) => {
                write!(f, "alpha must lie strictly between 0 and 1, got {}", alpha)
            }
            ConfigurationError::DesignRowOutOfRange { name, row, nrows } => write!(
                f,
                "{} row {} is out of range, the design has {} rows",
                name, row, nrows
            ),
            ConfigurationError::InvalidDesign(ref reason) => {
                write!(f, "invalid design specification: {}", reason)
            }
            ConfigurationError::InsufficientUnits(n) => write!(
                f,
                "insufficient units: the data must contain at least two units of observation, got {}",
                n
            ),
            ConfigurationError::DimensionMismatch {
                data_columns,
                design_columns,
            } => write!(
                f,
                "data has {} columns but the design has {}",
                data_columns, design_columns
            ),
        }
    }
}

#[derive(Debug)]
pub enum CorrelationError {
    Configuration(ConfigurationError),
    Distribution(StatsError),
}

impl std::error::Error for CorrelationError {}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CorrelationError::Configuration(ref e) => write!(f, "Configuration error: {}", e),
            CorrelationError::Distribution(ref e) => {
                write!(f, "Student's t distribution error: {}", e)
            }
        }
    }
}

impl From<ConfigurationError> for CorrelationError {
    fn from(e: ConfigurationError) -> Self {
        CorrelationError::Configuration(e)
    }
}

impl From<StatsError> for CorrelationError {
    fn from(e: StatsError) -> CorrelationError {
        CorrelationError::Distribution(e)
    }
}
