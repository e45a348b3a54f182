//! End-to-end statistical properties of the simulation engine.
//!
//! Outputs are statistical, not bit-exact: assertions either pin a seed or
//! use large trial counts with tolerances.

use chrono::NaiveDate;
use coinfolio_core::PriceTable;
use coinfolio_simulation::{MonteCarloSimulator, SimulationConfig, SimulationError};

fn table(columns: Vec<Vec<f64>>) -> PriceTable {
    let len = columns[0].len();
    let dates: Vec<NaiveDate> = (0..len)
        .map(|d| {
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
                + chrono::Days::new(u64::try_from(d).unwrap())
        })
        .collect();
    let assets: Vec<String> = (0..columns.len()).map(|i| format!("A{i}")).collect();
    PriceTable::new(dates, assets, columns).unwrap()
}

/// A gently drifting two-asset history with enough rows for stable stats.
fn drifting_pair() -> PriceTable {
    let a: Vec<f64> = (0..60)
        .map(|i| 100.0 * (1.0 + 0.002 * f64::from(i)) * (1.0 + 0.01 * f64::from(i % 3)))
        .collect();
    let b: Vec<f64> = (0..60)
        .map(|i| 40.0 * (1.0 + 0.001 * f64::from(i)) * (1.0 - 0.008 * f64::from(i % 4)))
        .collect();
    table(vec![a, b])
}

#[test]
fn two_asset_portfolio_produces_a_253_by_100_ensemble() {
    let config = SimulationConfig::new(100, 252).with_seed(42);
    let mut simulator =
        MonteCarloSimulator::new(drifting_pair(), Some(vec![0.6, 0.4]), config).unwrap();

    let ensemble = simulator.run();

    assert_eq!(ensemble.num_rows(), 253);
    assert_eq!(ensemble.num_trials(), 100);

    let summary = simulator.summarize();
    assert_eq!(summary.rows().len(), 10);
}

#[test]
fn confidence_interval_brackets_the_median_for_large_ensembles() {
    let config = SimulationConfig::new(500, 60).with_seed(99);
    let mut simulator = MonteCarloSimulator::new(drifting_pair(), None, config).unwrap();

    let summary = simulator.summarize();

    assert!(
        summary.ci_lower <= summary.median,
        "lower bound {} exceeded median {}",
        summary.ci_lower,
        summary.median
    );
    assert!(
        summary.median <= summary.ci_upper,
        "median {} exceeded upper bound {}",
        summary.median,
        summary.ci_upper
    );
    assert!(summary.ci_lower < summary.ci_upper);
}

#[test]
fn single_flat_asset_yields_a_constant_unit_path() {
    let flat = table(vec![vec![250.0; 10]]);
    let config = SimulationConfig::new(1, 5);
    let mut simulator = MonteCarloSimulator::new(flat, Some(vec![1.0]), config).unwrap();

    let ensemble = simulator.run();

    assert_eq!(ensemble.num_rows(), 6);
    for value in &ensemble.paths()[0] {
        assert!(
            (value - 1.0).abs() < f64::EPSILON,
            "flat history drifted to {value}"
        );
    }
}

#[test]
fn summarize_without_run_computes_exactly_once() {
    let config = SimulationConfig::new(200, 30).with_seed(7);
    let mut simulator = MonteCarloSimulator::new(drifting_pair(), None, config).unwrap();

    let summary = simulator.summarize();
    let finals = simulator.ensemble().final_values();

    // The summary must describe the ensemble now stored, not a fresh run
    let mean: f64 = finals.iter().sum::<f64>() / 200.0;
    assert!((summary.mean - mean).abs() < 1e-12);
    assert_eq!(summary.count, 200);
}

#[test]
fn repeated_unseeded_runs_share_shape_but_not_values() {
    let config = SimulationConfig::new(50, 20);
    let mut simulator = MonteCarloSimulator::new(drifting_pair(), None, config).unwrap();

    let first = simulator.run().final_values();
    let second = simulator.run().final_values();

    assert_eq!(first.len(), second.len());
    assert_ne!(first, second);
}

#[test]
fn weight_boundaries_match_the_tolerance_contract() {
    let below = MonteCarloSimulator::new(
        drifting_pair(),
        Some(vec![0.49, 0.49]),
        SimulationConfig::default(),
    );
    assert!(matches!(below, Err(SimulationError::InvalidWeights { .. })));

    let at_0995 = MonteCarloSimulator::new(
        drifting_pair(),
        Some(vec![0.5, 0.495]),
        SimulationConfig::default(),
    );
    assert!(at_0995.is_ok());

    let at_one = MonteCarloSimulator::new(
        drifting_pair(),
        Some(vec![0.6, 0.4]),
        SimulationConfig::default(),
    );
    assert!(at_one.is_ok());
}

#[test]
fn positive_drift_history_projects_growth_on_average() {
    // Steady +0.5%/day history: the ensemble mean final value should sit
    // clearly above 1.0 over a year
    let rising: Vec<f64> = (0..120).map(|i| 100.0 * 1.005f64.powi(i)).collect();
    let config = SimulationConfig::new(500, 252).with_seed(31);
    let mut simulator =
        MonteCarloSimulator::new(table(vec![rising]), Some(vec![1.0]), config).unwrap();

    let summary = simulator.summarize();

    assert!(
        summary.mean > 1.0,
        "mean final cumulative return was {}",
        summary.mean
    );
}
