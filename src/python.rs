use nalgebra::DMatrix;
use pyo3::{exceptions::PyRuntimeError, exceptions::PyValueError, prelude::*};

use crate::stats::correlation::CorrelationType;
use crate::stats::paired::{correlation_t, StatConfig};

#[pymodule]
fn _lowlevel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(correlation_t_impl, m)?)?;
    m.add_function(wrap_pyfunction!(paircorr_impl, m)?)?;
    Ok(())
}

fn to_matrix(rows: &[Vec<f64>], name: &str) -> PyResult<DMatrix<f64>> {
    let ncols = rows.first().map_or(0, |r| r.len());
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err(format!("{name} rows differ in length")));
    }
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DMatrix::from_row_slice(rows.len(), ncols, &values))
}

type CorrelationTuple = (
    Option<Vec<f64>>,
    Option<Vec<f64>>,
    usize,
    Option<Vec<f64>>,
    Option<Vec<f64>>,
);

/// Returns (stat, rho, df, critval, prob).
#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn correlation_t_impl(
    dat: Vec<Vec<f64>>,
    design: Vec<Vec<f64>>,
    uvar: Option<usize>,
    ivar: Option<usize>,
    tail: Option<i32>,
    alpha: Option<f64>,
    correlation_type: Option<String>,
    compute_stat: Option<bool>,
    compute_critval: Option<bool>,
    compute_prob: Option<bool>,
) -> PyResult<CorrelationTuple> {
    let correlation_type = correlation_type
        .map(|s| s.parse::<CorrelationType>())
        .transpose()
        .map_err(PyValueError::new_err)?;

    let config = StatConfig {
        compute_stat,
        compute_critval,
        compute_prob,
        alpha,
        tail,
        correlation_type,
        ivar,
        uvar,
    };

    let dat = to_matrix(&dat, "dat")?;
    let design = to_matrix(&design, "design")?;
    let result =
        correlation_t(&dat, &design, &config).map_err(|e| PyValueError::new_err(format!("{e}")))?;

    Ok((
        result.stat.map(|v| v.as_slice().to_vec()),
        result.rho.map(|v| v.as_slice().to_vec()),
        result.df,
        result.critval.map(|c| c.to_vec()),
        result.prob.map(|v| v.as_slice().to_vec()),
    ))
}

#[pyfunction]
#[allow(clippy::too_many_arguments)]
fn paircorr_impl(
    data: String,
    design: String,
    output_file: String,
    summary_file: Option<String>,
    uvar: Option<usize>,
    ivar: usize,
    tail: i32,
    alpha: f64,
    correlation_type: String,
    no_stat: bool,
    critval: bool,
    prob: bool,
    chunksize: usize,
    num_threads: usize,
    capacity: usize,
    compress: bool,
    quiet: bool,
) -> PyResult<()> {
    let args = crate::InputArguments {
        data,
        design,
        output_file,
        summary_file,
        uvar,
        ivar,
        tail,
        alpha,
        correlation_type: correlation_type.parse().map_err(PyValueError::new_err)?,
        no_stat,
        critval,
        prob,
        chunksize,
        num_threads,
        capacity,
        compress,
        quiet,
    };
    match crate::run_cli(args) {
        Ok(_) => Ok(()),
        Err(e) => Err(PyRuntimeError::new_err(format!("{e}"))),
    }
}
