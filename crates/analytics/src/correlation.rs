//! Pairwise correlation and covariance across a table's assets.
//!
//! Computed for display beside the weight search; the simulation engine
//! deliberately does not consume these (each asset is drawn independently).

use crate::returns::{log_returns, TRADING_DAYS_PER_YEAR};
use coinfolio_core::PriceTable;

/// Pearson correlation coefficient over the rows where both entries are
/// finite. Returns 0.0 when fewer than two such rows exist or either side
/// has no variance.
#[must_use]
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in &pairs {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator < f64::EPSILON {
        return 0.0;
    }

    covariance / denominator
}

/// Sample covariance (n - 1) over the rows where both entries are finite;
/// 0.0 when fewer than two such rows exist.
#[must_use]
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    pairs
        .iter()
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum::<f64>()
        / (n - 1.0)
}

/// Correlation matrix of the table's daily returns, asset order preserved.
#[must_use]
pub fn correlation_matrix(table: &PriceTable) -> Vec<Vec<f64>> {
    let n = table.num_assets();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in 0..i {
            let r = pearson_correlation(table.daily_returns(i), table.daily_returns(j));
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Annualized covariance matrix of the table's log returns
/// (sample covariance × 252).
#[must_use]
pub fn log_covariance_matrix(table: &PriceTable) -> Vec<Vec<f64>> {
    let n = table.num_assets();
    let columns: Vec<Vec<f64>> = (0..n).map(|i| log_returns(table.closes(i))).collect();

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let cov = sample_covariance(&columns[i], &columns[j]) * TRADING_DAYS_PER_YEAR;
            matrix[i][j] = cov;
            matrix[j][i] = cov;
        }
    }
    matrix
}
