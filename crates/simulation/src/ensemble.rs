//! Simulated path ensemble and the statistics derived from it.

use serde::{Deserialize, Serialize};

/// The cumulative-return paths produced by one simulation run: one path per
/// trial, each `num_trading_days + 1` rows long and starting at exactly 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEnsemble {
    paths: Vec<Vec<f64>>,
    num_trading_days: usize,
}

impl PathEnsemble {
    pub(crate) fn new(paths: Vec<Vec<f64>>, num_trading_days: usize) -> Self {
        Self {
            paths,
            num_trading_days,
        }
    }

    /// Number of trials (columns).
    #[must_use]
    pub fn num_trials(&self) -> usize {
        self.paths.len()
    }

    /// Number of rows per path: the simulated horizon plus the 1.0 start.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_trading_days + 1
    }

    /// All trial paths.
    #[must_use]
    pub fn paths(&self) -> &[Vec<f64>] {
        &self.paths
    }

    /// Final-day cumulative return of every trial.
    #[must_use]
    pub fn final_values(&self) -> Vec<f64> {
        self.paths
            .iter()
            .filter_map(|p| p.last().copied())
            .collect()
    }

    /// Cumulative return of every trial on `day` (0 = the 1.0 start row).
    #[must_use]
    pub fn day_values(&self, day: usize) -> Vec<f64> {
        self.paths
            .iter()
            .filter_map(|p| p.get(day).copied())
            .collect()
    }

    /// Per-day mean/median/min/max across trials, the series the dashboard
    /// charts.
    #[must_use]
    pub fn path_stats(&self) -> PathStats {
        let rows = self.num_rows();
        let mut mean = Vec::with_capacity(rows);
        let mut median = Vec::with_capacity(rows);
        let mut min = Vec::with_capacity(rows);
        let mut max = Vec::with_capacity(rows);

        for day in 0..rows {
            let mut values = self.day_values(day);
            if values.is_empty() {
                mean.push(f64::NAN);
                median.push(f64::NAN);
                min.push(f64::NAN);
                max.push(f64::NAN);
                continue;
            }
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            #[allow(clippy::cast_precision_loss)]
            let n = values.len() as f64;
            mean.push(values.iter().sum::<f64>() / n);
            median.push(percentile(&values, 0.50));
            min.push(values[0]);
            max.push(*values.last().expect("values non-empty"));
        }

        PathStats {
            mean,
            median,
            min,
            max,
        }
    }
}

/// Per-day ensemble statistics, one entry per path row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStats {
    pub mean: Vec<f64>,
    pub median: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// 95% confidence band of final cumulative returns: the [2.5th, 97.5th]
/// percentiles across trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Computes the interval from final-day values. NaN bounds for an empty
    /// ensemble.
    #[must_use]
    pub fn from_final_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            lower: percentile(&sorted, 0.025),
            upper: percentile(&sorted, 0.975),
        }
    }

    /// Both bounds scaled by an investment amount, for display only.
    #[must_use]
    pub fn scaled(&self, investment: f64) -> (f64, f64) {
        (self.lower * investment, self.upper * investment)
    }
}

/// Descriptive statistics of the final-day values plus the confidence
/// bounds: the ten labeled rows the dashboard prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub percentile_25: f64,
    pub median: f64,
    pub percentile_75: f64,
    pub max: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl ReturnSummary {
    /// Builds the summary from final-day values and the interval computed
    /// alongside them.
    #[must_use]
    pub fn from_final_values(values: &[f64], interval: ConfidenceInterval) -> Self {
        if values.is_empty() {
            return Self::empty(interval);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        #[allow(clippy::cast_precision_loss)]
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std_dev = if sorted.len() > 1 {
            (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Self {
            count: sorted.len(),
            mean,
            std_dev,
            min: sorted[0],
            percentile_25: percentile(&sorted, 0.25),
            median: percentile(&sorted, 0.50),
            percentile_75: percentile(&sorted, 0.75),
            max: *sorted.last().expect("sorted non-empty"),
            ci_lower: interval.lower,
            ci_upper: interval.upper,
        }
    }

    fn empty(interval: ConfidenceInterval) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            percentile_25: 0.0,
            median: 0.0,
            percentile_75: 0.0,
            max: 0.0,
            ci_lower: interval.lower,
            ci_upper: interval.upper,
        }
    }

    /// The summary as labeled rows, descriptive statistics first, the two
    /// confidence bounds labeled distinctly last.
    #[must_use]
    pub fn rows(&self) -> Vec<(&'static str, f64)> {
        #[allow(clippy::cast_precision_loss)]
        let count = self.count as f64;
        vec![
            ("count", count),
            ("mean", self.mean),
            ("std", self.std_dev),
            ("min", self.min),
            ("25%", self.percentile_25),
            ("50%", self.median),
            ("75%", self.percentile_75),
            ("max", self.max),
            ("95% CI Lower", self.ci_lower),
            ("95% CI Upper", self.ci_upper),
        ]
    }
}

/// Final-day values handed to the presentation layer for the distribution
/// histogram, with the interval it marks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalDistribution {
    pub values: Vec<f64>,
    pub confidence_interval: ConfidenceInterval,
}

/// Linearly interpolated percentile of an ascending-sorted slice, `q` in
/// [0, 1]. NaN for an empty slice.
#[must_use]
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    #[allow(clippy::cast_precision_loss)]
    let position = q * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower_index = position.floor() as usize;
    let upper_index = (lower_index + 1).min(sorted.len() - 1);
    let fraction = position - position.floor();

    sorted[lower_index] + (sorted[upper_index] - sorted[lower_index]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensemble() -> PathEnsemble {
        PathEnsemble::new(
            vec![
                vec![1.0, 1.1, 1.21],
                vec![1.0, 0.9, 0.81],
                vec![1.0, 1.0, 1.0],
            ],
            2,
        )
    }

    #[test]
    fn shape_accessors_report_rows_and_trials() {
        let e = ensemble();
        assert_eq!(e.num_trials(), 3);
        assert_eq!(e.num_rows(), 3);
    }

    #[test]
    fn final_values_read_the_last_row() {
        let finals = ensemble().final_values();
        assert_eq!(finals, vec![1.21, 0.81, 1.0]);
    }

    #[test]
    fn path_stats_bracket_every_trial() {
        let stats = ensemble().path_stats();

        assert_eq!(stats.min[2], 0.81);
        assert_eq!(stats.max[2], 1.21);
        assert!((stats.median[2] - 1.0).abs() < 1e-12);
        assert!((stats.mean[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_interpolates_between_values() {
        let sorted = [0.0, 10.0];
        assert!((percentile(&sorted, 0.5) - 5.0).abs() < 1e-12);
        assert!((percentile(&sorted, 0.0) - 0.0).abs() < 1e-12);
        assert!((percentile(&sorted, 1.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn confidence_interval_orders_bounds() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let ci = ConfidenceInterval::from_final_values(&values);

        assert!(ci.lower < ci.upper);
        assert!((ci.lower - 2.475).abs() < 1e-9);
        assert!((ci.upper - 96.525).abs() < 1e-9);
    }

    #[test]
    fn scaled_interval_multiplies_both_bounds() {
        let ci = ConfidenceInterval {
            lower: 0.5,
            upper: 2.0,
        };
        assert_eq!(ci.scaled(50_000.0), (25_000.0, 100_000.0));
    }

    #[test]
    fn summary_has_ten_labeled_rows() {
        let values = vec![0.8, 1.0, 1.2, 1.5];
        let ci = ConfidenceInterval::from_final_values(&values);
        let summary = ReturnSummary::from_final_values(&values, ci);

        let rows = summary.rows();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].0, "count");
        assert_eq!(rows[8].0, "95% CI Lower");
        assert_eq!(rows[9].0, "95% CI Upper");
    }

    #[test]
    fn summary_of_empty_values_is_zeroed() {
        let ci = ConfidenceInterval::from_final_values(&[]);
        let summary = ReturnSummary::from_final_values(&[], ci);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, 0.0);
    }

    #[test]
    fn summary_serialization_roundtrip() {
        let values = vec![0.9, 1.0, 1.1];
        let ci = ConfidenceInterval::from_final_values(&values);
        let summary = ReturnSummary::from_final_values(&values, ci);

        let json = serde_json::to_string(&summary).unwrap();
        let deserialized: ReturnSummary = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.count, summary.count);
        assert!((deserialized.mean - summary.mean).abs() < f64::EPSILON);
        assert!((deserialized.ci_upper - summary.ci_upper).abs() < f64::EPSILON);
    }
}
