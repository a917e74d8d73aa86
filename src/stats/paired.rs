use std::collections::BTreeMap;

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::stats::correlation::CorrelationType;
use crate::stats::error::{ConfigurationError, CorrelationError};
use crate::stats::tdist::{self, CriticalValues, Tail};

/// Caller-facing configuration. Every field is optional; `resolve` fills in
/// the defaults once and validates the result.
///
/// Defaults: `compute_stat = true`, `compute_critval = false`,
/// `compute_prob = false`, `alpha = 0.05`, `tail = 1`,
/// `correlation_type = Spearman`, `ivar = 1`. `uvar` has no default.
/// Design rows are numbered from 1.
#[derive(Debug, Clone, Default)]
pub struct StatConfig {
    pub compute_stat: Option<bool>,
    pub compute_critval: Option<bool>,
    pub compute_prob: Option<bool>,
    pub alpha: Option<f64>,
    pub tail: Option<i32>,
    pub correlation_type: Option<CorrelationType>,
    pub ivar: Option<usize>,
    pub uvar: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub compute_stat: bool,
    pub compute_critval: bool,
    pub compute_prob: bool,
    pub alpha: f64,
    pub tail: Tail,
    pub correlation_type: CorrelationType,
    pub ivar: usize,
    pub uvar: usize,
}

impl StatConfig {
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigurationError> {
        let compute_stat = self.compute_stat.unwrap_or(true);
        let compute_prob = self.compute_prob.unwrap_or(false);

        if compute_prob && !compute_stat {
            return Err(ConfigurationError::ProbWithoutStat);
        }

        let uvar = self.uvar.ok_or(ConfigurationError::MissingUnitVariable)?;
        let tail = Tail::try_from(self.tail.unwrap_or(1))?;

        let alpha = self.alpha.unwrap_or(0.05);
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigurationError::InvalidAlpha(alpha));
        }

        Ok(ResolvedConfig {
            compute_stat,
            compute_critval: self.compute_critval.unwrap_or(false),
            compute_prob,
            alpha,
            tail,
            correlation_type: self.correlation_type.unwrap_or_default(),
            ivar: self.ivar.unwrap_or(1),
            uvar,
        })
    }
}

/// For each unit of observation, in ascending id order, the design column
/// holding its condition-1 value and the one holding its condition-2 value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIndex {
    pub condition1: Vec<usize>,
    pub condition2: Vec<usize>,
}

fn design_row(
    design: &DMatrix<f64>,
    name: &'static str,
    row: usize,
) -> Result<usize, ConfigurationError> {
    if row == 0 || row > design.nrows() {
        return Err(ConfigurationError::DesignRowOutOfRange {
            name,
            row,
            nrows: design.nrows(),
        });
    }
    Ok(row - 1)
}

fn unit_id(value: f64) -> Result<usize, ConfigurationError> {
    if value.fract() != 0.0 || value < 1.0 || !value.is_finite() {
        return Err(ConfigurationError::InvalidDesign(format!(
            "unit of observation ids must be positive integers, got {}",
            value
        )));
    }
    Ok(value as usize)
}

impl UnitIndex {
    /// Build the index from the 1-based `ivar` and `uvar` rows of `design`.
    pub fn from_design(
        design: &DMatrix<f64>,
        ivar: usize,
        uvar: usize,
    ) -> Result<Self, ConfigurationError> {
        let ivar = design_row(design, "ivar", ivar)?;
        let uvar = design_row(design, "uvar", uvar)?;
        let n_columns = design.ncols();

        let labels = design.row(ivar);
        let sel1: Vec<usize> = (0..n_columns).filter(|&j| labels[j] == 1.0).collect();
        let sel2: Vec<usize> = (0..n_columns).filter(|&j| labels[j] == 2.0).collect();
        let (n1, n2) = (sel1.len(), sel2.len());

        if n1 + n2 != n_columns || n1 != n2 {
            return Err(ConfigurationError::InvalidDesign(format!(
                "expected two equally sized conditions covering all {} columns, \
                 found {} columns in condition 1 and {} in condition 2",
                n_columns, n1, n2
            )));
        }

        let units = design.row(uvar);
        let mut by_unit: BTreeMap<usize, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
        for &j in &sel1 {
            by_unit.entry(unit_id(units[j])?).or_default().0.push(j);
        }

        let n_units = by_unit.len();
        if n_units < 2 {
            return Err(ConfigurationError::InsufficientUnits(n_units));
        }
        // implied by n1 == n2 once every unit has one condition-1 column
        if n_units * 2 != n1 + n2 {
            return Err(ConfigurationError::InvalidDesign(format!(
                "{} units cannot account for {} columns",
                n_units,
                n1 + n2
            )));
        }

        for &j in &sel2 {
            let id = unit_id(units[j])?;
            let entry = by_unit.get_mut(&id).ok_or_else(|| {
                ConfigurationError::InvalidDesign(format!(
                    "unit {} appears in condition 2 but not in condition 1",
                    id
                ))
            })?;
            entry.1.push(j);
        }

        if by_unit.keys().next_back() != Some(&n_units) {
            return Err(ConfigurationError::InvalidDesign(format!(
                "unit of observation ids must run from 1 to {}",
                n_units
            )));
        }

        let mut condition1 = Vec::with_capacity(n_units);
        let mut condition2 = Vec::with_capacity(n_units);
        for (id, (c1, c2)) in by_unit {
            match (c1.as_slice(), c2.as_slice()) {
                ([c1], [c2]) => {
                    condition1.push(*c1);
                    condition2.push(*c2);
                }
                _ => {
                    return Err(ConfigurationError::InvalidDesign(format!(
                        "unit {} must have exactly one column per condition, found {} and {}",
                        id,
                        c1.len(),
                        c2.len()
                    )))
                }
            }
        }

        Ok(UnitIndex {
            condition1,
            condition2,
        })
    }

    pub fn n_units(&self) -> usize {
        self.condition1.len()
    }

    pub fn n_columns(&self) -> usize {
        self.condition1.len() + self.condition2.len()
    }
}

/// Per-observation output. Fields that were not requested are `None`.
#[derive(Debug, Clone)]
pub struct CorrelationT {
    pub stat: Option<DVector<f64>>,
    pub rho: Option<DVector<f64>>,
    pub df: usize,
    pub critval: Option<CriticalValues>,
    pub prob: Option<DVector<f64>>,
}

/// Convert a correlation coefficient into a t-statistic.
///
/// `|rho| == 1` divides by zero and yields an infinite or `NaN` statistic.
pub fn rho_to_t(rho: f64, n_units: usize) -> f64 {
    rho * (n_units as f64 - 2.0).sqrt() / (1.0 - rho.powi(2)).sqrt()
}

/// A validated configuration and design, ready to be applied to any number
/// of data matrices sharing the design's columns.
#[derive(Debug, Clone)]
pub struct PairedCorrelation {
    config: ResolvedConfig,
    units: UnitIndex,
}

impl PairedCorrelation {
    pub fn new(config: &StatConfig, design: &DMatrix<f64>) -> Result<Self, ConfigurationError> {
        let config = config.resolve()?;
        let units = UnitIndex::from_design(design, config.ivar, config.uvar)?;

        debug!(
            "Design validated: {} units over {} columns",
            units.n_units(),
            units.n_columns()
        );

        Ok(PairedCorrelation { config, units })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn n_units(&self) -> usize {
        self.units.n_units()
    }

    pub fn df(&self) -> usize {
        self.units.n_units() - 1
    }

    pub fn critical_values(&self) -> Result<Option<CriticalValues>, CorrelationError> {
        if !self.config.compute_critval {
            return Ok(None);
        }
        Ok(Some(tdist::critical_values(
            self.config.tail,
            self.config.alpha,
            self.df(),
        )?))
    }

    /// Rho and t for every row of `dat`, computed in parallel.
    pub fn rho_and_t(
        &self,
        dat: &DMatrix<f64>,
    ) -> Result<(DVector<f64>, DVector<f64>), ConfigurationError> {
        self.check_columns(dat)?;

        let n_units = self.n_units();
        let correlation_type = self.config.correlation_type;
        let units = &self.units;

        let pairs: Vec<(f64, f64)> = (0..dat.nrows())
            .into_par_iter()
            .map(|v| {
                let x: Vec<f64> = units.condition1.iter().map(|&j| dat[(v, j)]).collect();
                let y: Vec<f64> = units.condition2.iter().map(|&j| dat[(v, j)]).collect();
                let rho = correlation_type.correlate(&x, &y);
                (rho, rho_to_t(rho, n_units))
            })
            .collect();

        let rho = DVector::from_iterator(pairs.len(), pairs.iter().map(|p| p.0));
        let stat = DVector::from_iterator(pairs.len(), pairs.iter().map(|p| p.1));

        let n_non_finite = stat.iter().filter(|t| !t.is_finite()).count();
        if n_non_finite > 0 {
            warn!(
                "{} of {} observations have a non-finite t-statistic",
                n_non_finite,
                stat.len()
            );
        }

        Ok((rho, stat))
    }

    pub fn compute(&self, dat: &DMatrix<f64>) -> Result<CorrelationT, CorrelationError> {
        self.check_columns(dat)?;

        let (rho, stat) = if self.config.compute_stat {
            let (rho, stat) = self.rho_and_t(dat)?;
            (Some(rho), Some(stat))
        } else {
            (None, None)
        };

        let critval = self.critical_values()?;

        let prob = match (&stat, self.config.compute_prob) {
            (Some(stat), true) => {
                let t_dist = tdist::students_t(self.df())?;
                let tail = self.config.tail;
                Some(stat.map(|t| tdist::p_value(tail, t, &t_dist)))
            }
            _ => None,
        };

        Ok(CorrelationT {
            stat,
            rho,
            df: self.df(),
            critval,
            prob,
        })
    }

    fn check_columns(&self, dat: &DMatrix<f64>) -> Result<(), ConfigurationError> {
        if dat.ncols() != self.units.n_columns() {
            return Err(ConfigurationError::DimensionMismatch {
                data_columns: dat.ncols(),
                design_columns: self.units.n_columns(),
            });
        }
        Ok(())
    }
}

/// Validate `config` against `design` and compute the paired correlation
/// t-statistic for every row of `dat`.
pub fn correlation_t(
    dat: &DMatrix<f64>,
    design: &DMatrix<f64>,
    config: &StatConfig,
) -> Result<CorrelationT, CorrelationError> {
    PairedCorrelation::new(config, design)?.compute(dat)
}
