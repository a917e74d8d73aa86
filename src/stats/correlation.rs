use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Correlation coefficient used to pair the two conditions of each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CorrelationType {
    /// Rank correlation
    #[default]
    Spearman,
    /// Product-moment correlation
    Pearson,
    /// Kendall's tau-b
    Kendall,
}

impl CorrelationType {
    pub fn correlate(self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            CorrelationType::Spearman => spearman(x, y),
            CorrelationType::Pearson => pearson(x, y),
            CorrelationType::Kendall => kendall(x, y),
        }
    }
}

impl fmt::Display for CorrelationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorrelationType::Spearman => write!(f, "spearman"),
            CorrelationType::Pearson => write!(f, "pearson"),
            CorrelationType::Kendall => write!(f, "kendall"),
        }
    }
}

impl FromStr for CorrelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spearman" => Ok(CorrelationType::Spearman),
            "pearson" => Ok(CorrelationType::Pearson),
            "kendall" => Ok(CorrelationType::Kendall),
            other => Err(format!("unknown correlation type: {}", other)),
        }
    }
}

/// 1-based ranks of `values`. Tied values receive the average of the ranks
/// they span.
pub fn rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // positions i..j share ranks i+1..=j
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }
        i = j;
    }

    ranks
}

/// Pearson product-moment correlation.
///
/// Returns `NaN` if the series differ in length, either contains `NaN`, or
/// either has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return f64::NAN;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    cov / (var_x * var_y).sqrt()
}

/// Spearman rank correlation: Pearson correlation of the average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return f64::NAN;
    }
    pearson(&rank(x), &rank(y))
}

/// Kendall's tau-b, corrected for ties in either series. Series of
/// different lengths give `NaN`.
pub fn kendall(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return f64::NAN;
    }

    let n = x.len();
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut ties_x = 0i64;
    let mut ties_y = 0i64;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            if dx == 0.0 && dy == 0.0 {
                ties_x += 1;
                ties_y += 1;
            } else if dx == 0.0 {
                ties_x += 1;
            } else if dy == 0.0 {
                ties_y += 1;
            } else if (dx > 0.0) == (dy > 0.0) {
                concordant += 1;
            } else {
                discordant += 1;
            }
        }
    }

    let n0 = (n * n.saturating_sub(1) / 2) as f64;
    let denom = ((n0 - ties_x as f64) * (n0 - ties_y as f64)).sqrt();
    (concordant - discordant) as f64 / denom
}
