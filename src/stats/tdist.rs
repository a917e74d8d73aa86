use std::fmt;

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::StatsError;

use crate::stats::error::ConfigurationError;

/// Direction of the alternative hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    Left,
    Both,
    Right,
}

impl TryFrom<i32> for Tail {
    type Error = ConfigurationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Tail::Left),
            0 => Ok(Tail::Both),
            1 => Ok(Tail::Right),
            other => Err(ConfigurationError::UnsupportedTail(other)),
        }
    }
}

impl From<Tail> for i32 {
    fn from(tail: Tail) -> i32 {
        match tail {
            Tail::Left => -1,
            Tail::Both => 0,
            Tail::Right => 1,
        }
    }
}

impl fmt::Display for Tail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", i32::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CriticalValues {
    Single(f64),
    /// Lower and upper critical value of a two-tailed test
    Pair(f64, f64),
}

impl CriticalValues {
    pub fn to_vec(&self) -> Vec<f64> {
        match *self {
            CriticalValues::Single(c) => vec![c],
            CriticalValues::Pair(lower, upper) => vec![lower, upper],
        }
    }
}

pub fn students_t(degrees_of_freedom: usize) -> Result<StudentsT, StatsError> {
    StudentsT::new(0.0, 1.0, degrees_of_freedom as f64)
}

/// Critical value(s) of a Student's t distribution at significance `alpha`.
pub fn critical_values(
    tail: Tail,
    alpha: f64,
    degrees_of_freedom: usize,
) -> Result<CriticalValues, StatsError> {
    let t_dist = students_t(degrees_of_freedom)?;

    Ok(match tail {
        Tail::Left => CriticalValues::Single(t_dist.inverse_cdf(alpha)),
        Tail::Both => CriticalValues::Pair(
            t_dist.inverse_cdf(alpha / 2.0),
            t_dist.inverse_cdf(1.0 - alpha / 2.0),
        ),
        Tail::Right => CriticalValues::Single(t_dist.inverse_cdf(1.0 - alpha)),
    })
}

/// Probability of a statistic at least as extreme as `t_statistic`.
/// A `NaN` statistic gives a `NaN` probability.
pub fn p_value(tail: Tail, t_statistic: f64, t_dist: &StudentsT) -> f64 {
    if t_statistic.is_nan() {
        return f64::NAN;
    }

    match tail {
        Tail::Left => t_dist.cdf(t_statistic),
        Tail::Both => 2.0 * t_dist.cdf(-t_statistic.abs()),
        Tail::Right => 1.0 - t_dist.cdf(t_statistic),
    }
}
