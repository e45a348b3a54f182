//! Monte Carlo projection of portfolio cumulative returns.
//!
//! Models each asset's daily return as an i.i.d. normal draw parameterized
//! by the mean and standard deviation of its historical daily returns,
//! compounds a weighted portfolio path per trial, and derives the 95%
//! confidence band from the trial ensemble. Draws are independent across
//! trials, assets, and days; cross-asset correlation is computed for the
//! dashboard but not modeled here.
//!
//! # Example
//!
//! ```ignore
//! use coinfolio_simulation::{MonteCarloSimulator, SimulationConfig};
//!
//! let config = SimulationConfig::new(1000, 252);
//! let mut simulator = MonteCarloSimulator::new(table, None, config)?;
//! let summary = simulator.summarize();
//! println!("95% CI: [{:.3}, {:.3}]", summary.ci_lower, summary.ci_upper);
//! ```

use crate::ensemble::{
    ConfidenceInterval, FinalDistribution, PathEnsemble, PathStats, ReturnSummary,
};
use crate::error::{Result, SimulationError};
use coinfolio_core::PriceTable;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of independent trials.
    pub num_simulations: usize,
    /// Trading days to simulate per trial.
    pub num_trading_days: usize,
    /// Optional seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: 1000,
            num_trading_days: 252,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration with the given trial count and horizon.
    #[must_use]
    pub fn new(num_simulations: usize, num_trading_days: usize) -> Self {
        Self {
            num_simulations,
            num_trading_days,
            seed: None,
        }
    }

    /// Sets a seed for a reproducible run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Historical daily-return statistics for one asset, the parameters of its
/// simulated normal draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetReturnStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl AssetReturnStats {
    /// Mean and sample standard deviation over the finite entries of a
    /// daily-return column. A column with no usable history degrades to
    /// (0, 0), which simulates a flat path rather than poisoning the
    /// ensemble with NaN.
    #[must_use]
    pub fn from_daily_returns(returns: &[f64]) -> Self {
        let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
        if finite.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let std_dev = if finite.len() > 1 {
            (finite.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Self { mean, std_dev }
    }
}

/// Tagged simulation state: nothing computed yet, or a complete outcome.
#[derive(Debug, Clone)]
enum SimulationState {
    Uninitialized,
    Computed(SimulationOutcome),
}

#[derive(Debug, Clone)]
struct SimulationOutcome {
    ensemble: PathEnsemble,
    confidence_interval: ConfidenceInterval,
}

/// Monte Carlo simulator over a portfolio price table.
///
/// The simulator owns its table snapshot, weight vector, and the ensemble it
/// produces; each run overwrites the previous outcome wholesale. Accessors
/// that need an ensemble trigger one run lazily.
pub struct MonteCarloSimulator {
    table: PriceTable,
    weights: Vec<f64>,
    config: SimulationConfig,
    state: SimulationState,
}

impl MonteCarloSimulator {
    /// Creates a simulator over `table`.
    ///
    /// When `weights` is `None`, a uniform `1/n` vector is synthesized.
    /// Supplied weights must carry one entry per asset and sum to one within
    /// tolerance: the sum rounded to two decimals must be at least 0.99.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::WeightCountMismatch`] or
    /// [`SimulationError::InvalidWeights`] for a bad weight vector.
    pub fn new(
        table: PriceTable,
        weights: Option<Vec<f64>>,
        config: SimulationConfig,
    ) -> Result<Self> {
        let weights = match weights {
            Some(weights) => {
                validate_weights(&weights, table.num_assets())?;
                weights
            }
            None => {
                #[allow(clippy::cast_precision_loss)]
                let uniform = 1.0 / table.num_assets() as f64;
                vec![uniform; table.num_assets()]
            }
        };

        Ok(Self {
            table,
            weights,
            config,
            state: SimulationState::Uninitialized,
        })
    }

    /// The portfolio weights in table asset order.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The table snapshot the simulator was built over.
    #[must_use]
    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// True once an ensemble has been computed.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self.state, SimulationState::Computed(_))
    }

    /// Historical (mean, std) per asset, the draw parameters of a run.
    #[must_use]
    pub fn asset_return_stats(&self) -> Vec<AssetReturnStats> {
        (0..self.table.num_assets())
            .map(|i| AssetReturnStats::from_daily_returns(self.table.daily_returns(i)))
            .collect()
    }

    /// Runs the simulation, replacing any previous ensemble, and returns the
    /// new one.
    pub fn run(&mut self) -> &PathEnsemble {
        let outcome = self.compute(None);
        self.state = SimulationState::Computed(outcome);
        self.computed().map(|o| &o.ensemble).expect("state just set")
    }

    /// Runs the simulation, reporting `(completed, total)` after each trial.
    pub fn run_with_progress(&mut self, mut progress: impl FnMut(usize, usize)) -> &PathEnsemble {
        let outcome = self.compute(Some(&mut progress));
        self.state = SimulationState::Computed(outcome);
        self.computed().map(|o| &o.ensemble).expect("state just set")
    }

    /// The current ensemble, computing one first if no run has happened.
    pub fn ensemble(&mut self) -> &PathEnsemble {
        &self.ensure_computed().ensemble
    }

    /// The 95% confidence interval of final cumulative returns, computing
    /// the ensemble first if needed.
    pub fn confidence_interval(&mut self) -> ConfidenceInterval {
        self.ensure_computed().confidence_interval
    }

    /// Descriptive statistics of the final-day values plus the confidence
    /// bounds, computing the ensemble first if needed.
    pub fn summarize(&mut self) -> ReturnSummary {
        let outcome = self.ensure_computed();
        ReturnSummary::from_final_values(
            &outcome.ensemble.final_values(),
            outcome.confidence_interval,
        )
    }

    /// Per-day mean/median/min/max series for the trajectory chart,
    /// computing the ensemble first if needed.
    pub fn path_stats(&mut self) -> PathStats {
        self.ensure_computed().ensemble.path_stats()
    }

    /// Final-day values and confidence bounds for the distribution
    /// histogram, computing the ensemble first if needed.
    pub fn final_distribution(&mut self) -> FinalDistribution {
        let outcome = self.ensure_computed();
        FinalDistribution {
            values: outcome.ensemble.final_values(),
            confidence_interval: outcome.confidence_interval,
        }
    }

    fn computed(&self) -> Option<&SimulationOutcome> {
        match &self.state {
            SimulationState::Computed(outcome) => Some(outcome),
            SimulationState::Uninitialized => None,
        }
    }

    fn ensure_computed(&mut self) -> &SimulationOutcome {
        if !self.is_computed() {
            let outcome = self.compute(None);
            self.state = SimulationState::Computed(outcome);
        }
        self.computed().expect("state just set")
    }

    fn compute(&self, mut progress: Option<&mut dyn FnMut(usize, usize)>) -> SimulationOutcome {
        let last_prices = self.table.latest_closes();
        let stats = self.asset_return_stats();
        let normals: Vec<Normal<f64>> = stats
            .iter()
            .map(|s| Normal::new(s.mean, s.std_dev).expect("stats are finite and non-negative"))
            .collect();

        let num_days = self.config.num_trading_days;
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut paths = Vec::with_capacity(self.config.num_simulations);
        for trial in 0..self.config.num_simulations {
            // Row 0 is the undefined first return, coerced to zero so every
            // path compounds from exactly 1.0
            let mut portfolio_returns = vec![0.0; num_days + 1];

            for (asset, normal) in normals.iter().enumerate() {
                let weight = self.weights[asset];
                let mut previous = last_prices[asset];

                for day in 1..=num_days {
                    let draw = normal.sample(&mut rng);
                    let next = previous * (1.0 + draw);
                    // Percent change of the simulated path; a zero price
                    // upstream yields a non-finite change, coerced to zero
                    let daily = next / previous - 1.0;
                    let daily = if daily.is_finite() { daily } else { 0.0 };
                    portfolio_returns[day] += weight * daily;
                    previous = next;
                }
            }

            let mut path = Vec::with_capacity(num_days + 1);
            let mut cumulative = 1.0;
            for r in &portfolio_returns {
                let r = if r.is_finite() { *r } else { 0.0 };
                cumulative *= 1.0 + r;
                path.push(cumulative);
            }
            paths.push(path);

            if let Some(report) = progress.as_deref_mut() {
                report(trial + 1, self.config.num_simulations);
            }
        }

        let ensemble = PathEnsemble::new(paths, num_days);
        let confidence_interval = ConfidenceInterval::from_final_values(&ensemble.final_values());

        SimulationOutcome {
            ensemble,
            confidence_interval,
        }
    }
}

fn validate_weights(weights: &[f64], num_assets: usize) -> Result<()> {
    if weights.len() != num_assets {
        return Err(SimulationError::WeightCountMismatch {
            expected: num_assets,
            got: weights.len(),
        });
    }

    let sum: f64 = weights.iter().sum();
    if (sum * 100.0).round() < 99.0 {
        return Err(SimulationError::InvalidWeights { sum });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(columns: Vec<Vec<f64>>) -> PriceTable {
        let len = columns[0].len();
        let dates: Vec<NaiveDate> = (0..len)
            .map(|d| {
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                    + chrono::Days::new(u64::try_from(d).unwrap())
            })
            .collect();
        let assets: Vec<String> = (0..columns.len()).map(|i| format!("A{i}")).collect();
        PriceTable::new(dates, assets, columns).unwrap()
    }

    fn two_asset_table() -> PriceTable {
        table(vec![
            vec![100.0, 105.0, 103.0, 110.0, 108.0],
            vec![50.0, 49.0, 52.0, 51.0, 53.0],
        ])
    }

    // ============================================================
    // SimulationConfig Tests
    // ============================================================

    #[test]
    fn config_default_has_expected_values() {
        let config = SimulationConfig::default();

        assert_eq!(config.num_simulations, 1000);
        assert_eq!(config.num_trading_days, 252);
        assert!(config.seed.is_none());
    }

    #[test]
    fn config_with_seed_sets_seed() {
        let config = SimulationConfig::new(100, 20).with_seed(42);
        assert_eq!(config.seed, Some(42));
    }

    // ============================================================
    // Weight Validation Tests
    // ============================================================

    #[test]
    fn uniform_weights_synthesized_when_absent() {
        let simulator =
            MonteCarloSimulator::new(two_asset_table(), None, SimulationConfig::default()).unwrap();

        assert_eq!(simulator.weights(), &[0.5, 0.5]);
    }

    #[test]
    fn weights_summing_below_tolerance_are_rejected() {
        let result = MonteCarloSimulator::new(
            two_asset_table(),
            Some(vec![0.5, 0.48]),
            SimulationConfig::default(),
        );

        assert!(matches!(result, Err(SimulationError::InvalidWeights { .. })));
    }

    #[test]
    fn weights_summing_to_exactly_0_98_are_rejected() {
        let result = MonteCarloSimulator::new(
            two_asset_table(),
            Some(vec![0.49, 0.49]),
            SimulationConfig::default(),
        );

        assert!(matches!(result, Err(SimulationError::InvalidWeights { .. })));
    }

    #[test]
    fn weights_summing_to_0_995_are_accepted() {
        let result = MonteCarloSimulator::new(
            two_asset_table(),
            Some(vec![0.5, 0.495]),
            SimulationConfig::default(),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn weights_summing_to_0_99_are_accepted() {
        let result = MonteCarloSimulator::new(
            two_asset_table(),
            Some(vec![0.5, 0.49]),
            SimulationConfig::default(),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn wrong_weight_count_is_rejected() {
        let result = MonteCarloSimulator::new(
            two_asset_table(),
            Some(vec![1.0]),
            SimulationConfig::default(),
        );

        assert!(matches!(
            result,
            Err(SimulationError::WeightCountMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    // ============================================================
    // Ensemble Shape Tests
    // ============================================================

    #[test]
    fn ensemble_has_horizon_plus_one_rows_and_trial_columns() {
        let config = SimulationConfig::new(25, 10).with_seed(42);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let ensemble = simulator.run();

        assert_eq!(ensemble.num_trials(), 25);
        assert_eq!(ensemble.num_rows(), 11);
        for path in ensemble.paths() {
            assert_eq!(path.len(), 11);
        }
    }

    #[test]
    fn every_path_starts_at_exactly_one() {
        let config = SimulationConfig::new(50, 5).with_seed(7);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let ensemble = simulator.run();

        for path in ensemble.paths() {
            assert!((path[0] - 1.0).abs() < f64::EPSILON, "path started at {}", path[0]);
        }
    }

    #[test]
    fn zero_trials_produce_an_empty_ensemble() {
        let config = SimulationConfig::new(0, 10).with_seed(1);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let ensemble = simulator.run();
        assert_eq!(ensemble.num_trials(), 0);
    }

    #[test]
    fn zero_horizon_produces_bare_start_rows() {
        let config = SimulationConfig::new(3, 0).with_seed(1);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let ensemble = simulator.run();
        assert_eq!(ensemble.num_rows(), 1);
        for path in ensemble.paths() {
            assert_eq!(path, &vec![1.0]);
        }
    }

    // ============================================================
    // Degenerate Statistics Tests
    // ============================================================

    #[test]
    fn flat_history_simulates_a_constant_path() {
        // Constant prices: daily returns have mean 0 and std 0, so every
        // draw is exactly the mean and the path never moves
        let flat = table(vec![vec![100.0, 100.0, 100.0, 100.0]]);
        let config = SimulationConfig::new(1, 5).with_seed(42);
        let mut simulator = MonteCarloSimulator::new(flat, Some(vec![1.0]), config).unwrap();

        let ensemble = simulator.run();

        assert_eq!(ensemble.num_rows(), 6);
        for value in &ensemble.paths()[0] {
            assert!((value - 1.0).abs() < f64::EPSILON, "path value was {value}");
        }
    }

    #[test]
    fn zero_starting_price_does_not_poison_the_path() {
        // Final close of the second asset is zero; its simulated percent
        // changes are non-finite and must be coerced to zero
        let zero_tail = table(vec![
            vec![100.0, 105.0, 103.0, 110.0],
            vec![50.0, 40.0, 20.0, 0.0],
        ]);
        let config = SimulationConfig::new(10, 5).with_seed(3);
        let mut simulator = MonteCarloSimulator::new(zero_tail, None, config).unwrap();

        let ensemble = simulator.run();

        for path in ensemble.paths() {
            for value in path {
                assert!(value.is_finite(), "ensemble leaked a non-finite value");
            }
        }
    }

    // ============================================================
    // State Machine Tests
    // ============================================================

    #[test]
    fn summarize_triggers_a_lazy_run() {
        let config = SimulationConfig::new(50, 10).with_seed(11);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();
        assert!(!simulator.is_computed());

        let summary = simulator.summarize();

        assert!(simulator.is_computed());
        assert_eq!(summary.count, 50);
    }

    #[test]
    fn lazy_accessors_reuse_the_same_ensemble() {
        let config = SimulationConfig::new(50, 10).with_seed(11);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let summary = simulator.summarize();
        let interval = simulator.confidence_interval();

        // Same outcome, not a recomputation
        assert!((summary.ci_lower - interval.lower).abs() < f64::EPSILON);
        assert!((summary.ci_upper - interval.upper).abs() < f64::EPSILON);
    }

    #[test]
    fn rerun_overwrites_the_previous_ensemble() {
        let config = SimulationConfig::new(20, 10);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let first_finals = simulator.run().final_values();
        let second_finals = simulator.run().final_values();

        assert_eq!(first_finals.len(), second_finals.len());
        // Entropy-seeded runs almost surely differ
        assert_ne!(first_finals, second_finals);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = SimulationConfig::new(30, 15).with_seed(1234);
        let mut a = MonteCarloSimulator::new(two_asset_table(), None, config.clone()).unwrap();
        let mut b = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        assert_eq!(a.run().final_values(), b.run().final_values());
    }

    // ============================================================
    // Presentation Accessor Tests
    // ============================================================

    #[test]
    fn path_stats_cover_every_row() {
        let config = SimulationConfig::new(40, 12).with_seed(5);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let stats = simulator.path_stats();

        assert_eq!(stats.mean.len(), 13);
        assert_eq!(stats.median.len(), 13);
        assert!((stats.mean[0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn final_distribution_matches_the_ensemble() {
        let config = SimulationConfig::new(40, 12).with_seed(5);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let distribution = simulator.final_distribution();

        assert_eq!(distribution.values.len(), 40);
        assert!(distribution.confidence_interval.lower <= distribution.confidence_interval.upper);
    }

    #[test]
    fn progress_callback_reports_every_trial() {
        let config = SimulationConfig::new(8, 3).with_seed(2);
        let mut simulator = MonteCarloSimulator::new(two_asset_table(), None, config).unwrap();

        let mut seen = Vec::new();
        simulator.run_with_progress(|completed, total| seen.push((completed, total)));

        assert_eq!(seen.len(), 8);
        assert_eq!(seen.first(), Some(&(1, 8)));
        assert_eq!(seen.last(), Some(&(8, 8)));
    }

    #[test]
    fn asset_return_stats_match_the_history() {
        let t = table(vec![vec![100.0, 110.0, 99.0]]);
        let simulator =
            MonteCarloSimulator::new(t, None, SimulationConfig::default()).unwrap();

        let stats = simulator.asset_return_stats();
        let r1 = 0.1;
        let r2 = 99.0 / 110.0 - 1.0;
        let mean = (r1 + r2) / 2.0;

        assert!((stats[0].mean - mean).abs() < 1e-12);
        assert!(stats[0].std_dev > 0.0);
    }
}
