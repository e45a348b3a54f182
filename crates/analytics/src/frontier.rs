//! Random-weight portfolio search over the Sharpe surface.
//!
//! Draws uniform weight vectors, rebalances each to sum to one, and scores
//! it by annualized log-return mean, volatility, and Sharpe ratio. This is
//! deliberately sampling, not a solver: the best draw out of `num_portfolios`
//! stands in for the efficient frontier.

use crate::correlation::log_covariance_matrix;
use crate::returns::{log_returns, sample_mean, TRADING_DAYS_PER_YEAR};
use anyhow::{anyhow, Result};
use coinfolio_core::PriceTable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the random-weight search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierConfig {
    /// Number of random portfolios to draw.
    pub num_portfolios: usize,
    /// Optional seed for reproducible searches.
    pub seed: Option<u64>,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            num_portfolios: 1000,
            seed: None,
        }
    }
}

impl FrontierConfig {
    /// Creates a configuration drawing `num_portfolios` samples.
    #[must_use]
    pub fn new(num_portfolios: usize) -> Self {
        Self {
            num_portfolios,
            ..Default::default()
        }
    }

    /// Sets a seed for a reproducible search.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One scored weight draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Portfolio weights in table asset order, summing to one.
    pub weights: Vec<f64>,
    /// Annualized expected log return.
    pub expected_return: f64,
    /// Annualized volatility √(wᵀ·Σ·w).
    pub volatility: f64,
    /// Sharpe ratio (return / volatility).
    pub sharpe_ratio: f64,
}

/// Outcome of a search: the best-Sharpe draw plus every sample for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierResult {
    pub best: FrontierPoint,
    pub samples: Vec<FrontierPoint>,
}

/// Runs the random-weight search over the table's assets.
///
/// # Errors
///
/// Returns an error with fewer than two assets or zero portfolios.
pub fn search(table: &PriceTable, config: &FrontierConfig) -> Result<FrontierResult> {
    let n = table.num_assets();
    if n < 2 {
        return Err(anyhow!(
            "portfolio search needs at least 2 assets, got {n}"
        ));
    }
    if config.num_portfolios == 0 {
        return Err(anyhow!("portfolio search needs at least 1 sample"));
    }

    // Annualized log-return means and covariance, computed once
    let mean_log_returns: Vec<f64> = (0..n)
        .map(|i| sample_mean(&log_returns(table.closes(i))) * TRADING_DAYS_PER_YEAR)
        .collect();
    let covariance = log_covariance_matrix(table);

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut samples = Vec::with_capacity(config.num_portfolios);
    let mut best_index = 0usize;
    let mut best_sharpe = f64::NEG_INFINITY;

    for index in 0..config.num_portfolios {
        // Draw and rebalance weights to sum to one
        let mut weights: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }

        let expected_return: f64 = weights
            .iter()
            .zip(&mean_log_returns)
            .map(|(w, mu)| w * mu)
            .sum();

        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += weights[i] * covariance[i][j] * weights[j];
            }
        }
        let volatility = variance.max(0.0).sqrt();

        let sharpe_ratio = if volatility > 0.0 {
            expected_return / volatility
        } else {
            0.0
        };

        if sharpe_ratio > best_sharpe {
            best_sharpe = sharpe_ratio;
            best_index = index;
        }

        samples.push(FrontierPoint {
            weights,
            expected_return,
            volatility,
            sharpe_ratio,
        });
    }

    Ok(FrontierResult {
        best: samples[best_index].clone(),
        samples,
    })
}
