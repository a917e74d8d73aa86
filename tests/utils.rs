#![allow(dead_code)]

use std::path::Path;

use nalgebra::{DMatrix, DVector};
use paircorr::stats::correlation::CorrelationType;
use paircorr::InputArguments;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

pub struct TestData {
    pub observation_ids: Vec<String>,
    pub replication_ids: Vec<String>,
    pub data: DMatrix<f64>,
    pub design: DMatrix<f64>,
    pub n_units: usize,
}

/// Condition-2 columns come first, in descending unit order, followed by the
/// condition-1 columns in ascending unit order.
fn build_design(n_units: usize) -> DMatrix<f64> {
    let n_columns = 2 * n_units;
    DMatrix::from_fn(2, n_columns, |row, col| {
        let (condition, unit) = if col < n_units {
            (2, n_units - col)
        } else {
            (1, col - n_units + 1)
        };
        if row == 0 {
            condition as f64
        } else {
            unit as f64
        }
    })
}

// Simulate
pub fn build_test(n_observations: usize, n_units: usize) -> TestData {
    let design = build_design(n_units);
    let noise = DMatrix::<f64>::new_random(n_observations, 2 * n_units);
    let shared = DMatrix::<f64>::new_random(n_observations, n_units);

    // condition 2 shares a component with condition 1 of the same unit
    let data = DMatrix::from_fn(n_observations, 2 * n_units, |i, j| {
        let unit = design[(1, j)] as usize - 1;
        let weight = (i % 5) as f64 / 4.0;
        weight * shared[(i, unit)] + noise[(i, j)]
    });

    TestData {
        observation_ids: (0..n_observations).map(|x| format!("obs_{}", x)).collect(),
        replication_ids: (0..2 * n_units).map(|x| format!("rep_{}", x)).collect(),
        data,
        design,
        n_units,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub observation_id: String,
    pub rho: f64,
    pub t_stat: f64,
    #[serde(default)]
    pub p_value: Option<f64>,
}

fn ranks(values: &DVector<f64>) -> DVector<f64> {
    DVector::from_fn(values.len(), |i, _| {
        1.0 + values.iter().filter(|&&v| v < values[i]).count() as f64
    })
}

fn direct_correlation(
    observation_id: String,
    x: DVector<f64>,
    y: DVector<f64>,
    correlation_type: CorrelationType,
    t_dist: &StudentsT,
) -> CorrelationResult {
    let (x, y) = match correlation_type {
        CorrelationType::Spearman => (ranks(&x), ranks(&y)),
        CorrelationType::Pearson => (x, y),
        CorrelationType::Kendall => unimplemented!("no direct Kendall reference"),
    };
    let n = x.len();
    let xc = x.add_scalar(-x.mean());
    let yc = y.add_scalar(-y.mean());
    let rho = xc.dot(&yc) / (xc.norm() * yc.norm());
    let t_stat = rho * ((n - 2) as f64 / (1.0 - rho * rho)).sqrt();

    CorrelationResult {
        observation_id,
        rho,
        t_stat,
        p_value: Some(1.0 - t_dist.cdf(t_stat)),
    }
}

/// Right-tailed reference results, pairing columns by searching the design.
pub fn direct_results(
    test_data: &TestData,
    correlation_type: CorrelationType,
) -> Vec<CorrelationResult> {
    let n_units = test_data.n_units;
    let t_dist = StudentsT::new(0.0, 1.0, (n_units - 1) as f64).unwrap();
    let column_of = |condition: f64, unit: usize| -> usize {
        (0..test_data.design.ncols())
            .find(|&j| {
                test_data.design[(0, j)] == condition && test_data.design[(1, j)] == unit as f64
            })
            .unwrap()
    };
    let cond1: Vec<usize> = (1..=n_units).map(|u| column_of(1.0, u)).collect();
    let cond2: Vec<usize> = (1..=n_units).map(|u| column_of(2.0, u)).collect();

    (0..test_data.data.nrows())
        .into_par_iter()
        .map(|i| {
            let x = DVector::from_iterator(n_units, cond1.iter().map(|&j| test_data.data[(i, j)]));
            let y = DVector::from_iterator(n_units, cond2.iter().map(|&j| test_data.data[(i, j)]));
            direct_correlation(
                test_data.observation_ids[i].clone(),
                x,
                y,
                correlation_type,
                &t_dist,
            )
        })
        .collect()
}

fn write_labeled(
    path: &Path,
    corner: &str,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &DMatrix<f64>,
) -> Result<(), std::io::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header_row = col_labels.to_vec();
    header_row.insert(0, corner.to_string());
    writer.write_record(header_row)?;
    for (idx, row) in matrix.row_iter().enumerate() {
        let mut row_vec = row.iter().map(|x| x.to_string()).collect::<Vec<String>>();
        row_vec.insert(0, row_labels[idx].clone());
        writer.write_record(row_vec)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_test_data(test_data: &TestData, dir: &Path) -> Result<(), std::io::Error> {
    write_labeled(
        &dir.join("data.csv"),
        "observation_id",
        &test_data.observation_ids,
        &test_data.replication_ids,
        &test_data.data,
    )?;
    write_labeled(
        &dir.join("design.csv"),
        "row",
        &["condition".to_string(), "subject".to_string()],
        &test_data.replication_ids,
        &test_data.design,
    )
}

pub fn setup_test(
    dir: &Path,
    n_observations: usize,
    n_units: usize,
) -> (TestData, InputArguments) {
    let test_data = build_test(n_observations, n_units);
    write_test_data(&test_data, dir).unwrap();

    let args = InputArguments {
        data: dir.join("data.csv").to_str().unwrap().to_string(),
        design: dir.join("design.csv").to_str().unwrap().to_string(),
        output_file: dir.join("paircorr_results.csv").to_str().unwrap().to_string(),
        summary_file: None,
        uvar: Some(2),
        ivar: 1,
        tail: 1,
        alpha: 0.05,
        correlation_type: CorrelationType::Spearman,
        no_stat: false,
        critval: false,
        prob: false,
        chunksize: n_observations,
        num_threads: 1,
        capacity: 25,
        compress: false,
        quiet: true,
    };

    (test_data, args)
}

pub fn read_results<R: std::io::Read>(reader: R) -> Vec<CorrelationResult> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut results = Vec::new();
    for result in reader.deserialize() {
        let result = result.unwrap();
        results.push(result);
    }
    results
}

pub fn read_results_file(path: &str) -> Vec<CorrelationResult> {
    read_results(std::fs::File::open(path).unwrap())
}

pub fn check_results(
    direct: &[CorrelationResult],
    computed: &[CorrelationResult],
    with_prob: bool,
) {
    let tol = 1e-9;

    assert_eq!(direct.len(), computed.len());
    for (direct, computed) in direct.iter().zip(computed.iter()) {
        assert_eq!(direct.observation_id, computed.observation_id);

        assert!(
            (direct.rho - computed.rho).abs() < tol,
            "Rho - Direct: {}, Computed: {}",
            direct.rho,
            computed.rho
        );
        assert!(
            (direct.t_stat - computed.t_stat).abs() < tol * direct.t_stat.abs().max(1.0),
            "T - Direct: {}, Computed: {}",
            direct.t_stat,
            computed.t_stat
        );
        if with_prob {
            let (d, c) = (direct.p_value.unwrap(), computed.p_value.unwrap());
            assert!((d - c).abs() < tol, "P - Direct: {}, Computed: {}", d, c);
        } else {
            assert!(computed.p_value.is_none());
        }
    }
}
