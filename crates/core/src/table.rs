//! Tabular price history shared by the analytics and simulation crates.
//!
//! A `PriceTable` holds one ascending date index and, per asset, a column of
//! closing prices plus a derived column of daily returns. The last row is
//! always the most recent observation, which is what the simulation engine
//! reads as its starting price.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building a price table.
#[derive(Debug, Error)]
pub enum TableError {
    /// No asset columns were supplied.
    #[error("price table must contain at least one asset")]
    Empty,

    /// An asset column does not line up with the date index.
    #[error("asset {asset} has {got} prices but the date index has {expected}")]
    ColumnLengthMismatch {
        /// Asset whose column is misaligned.
        asset: String,
        /// Length of the date index.
        expected: usize,
        /// Length of the asset column.
        got: usize,
    },

    /// Too little history to derive a daily return.
    #[error("price history needs at least 2 rows to derive daily returns, got {got}")]
    InsufficientRows {
        /// Number of rows supplied.
        got: usize,
    },
}

/// Closing-price history for a set of assets on a shared date index.
#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    closes: Vec<Vec<f64>>,
    daily_returns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Builds a table from a date index and one closing-price column per
    /// asset, deriving the daily-return columns. Rows are sorted oldest to
    /// newest; the daily return is the percent change between consecutive
    /// closes with the first entry undefined (NaN).
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Empty`] with no assets,
    /// [`TableError::ColumnLengthMismatch`] if a column does not match the
    /// date index, and [`TableError::InsufficientRows`] with fewer than two
    /// rows.
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        closes: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::assemble(dates, assets, closes, None)?;
        table.daily_returns = table.closes.iter().map(|col| pct_change(col)).collect();
        Ok(table)
    }

    /// Builds a table with precomputed daily-return columns instead of
    /// deriving them. Return columns must line up with the date index the
    /// same way the close columns do.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PriceTable::new`].
    pub fn with_daily_returns(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        closes: Vec<Vec<f64>>,
        daily_returns: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        Self::assemble(dates, assets, closes, Some(daily_returns))
    }

    fn assemble(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        closes: Vec<Vec<f64>>,
        daily_returns: Option<Vec<Vec<f64>>>,
    ) -> Result<Self, TableError> {
        if assets.is_empty() || closes.is_empty() {
            return Err(TableError::Empty);
        }
        if dates.len() < 2 {
            return Err(TableError::InsufficientRows { got: dates.len() });
        }
        for (asset, column) in assets.iter().zip(&closes) {
            if column.len() != dates.len() {
                return Err(TableError::ColumnLengthMismatch {
                    asset: asset.clone(),
                    expected: dates.len(),
                    got: column.len(),
                });
            }
        }
        if let Some(returns) = &daily_returns {
            for (asset, column) in assets.iter().zip(returns) {
                if column.len() != dates.len() {
                    return Err(TableError::ColumnLengthMismatch {
                        asset: asset.clone(),
                        expected: dates.len(),
                        got: column.len(),
                    });
                }
            }
        }

        // Sort rows oldest to newest, applying the same permutation to every
        // column so rows stay aligned.
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);

        let dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();
        let closes: Vec<Vec<f64>> = closes
            .into_iter()
            .map(|col| order.iter().map(|&i| col[i]).collect())
            .collect();
        let daily_returns = daily_returns
            .map(|columns| {
                columns
                    .into_iter()
                    .map(|col| order.iter().map(|&i| col[i]).collect())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            dates,
            assets,
            closes,
            daily_returns,
        })
    }

    /// Number of assets in the table.
    #[must_use]
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of rows (trading dates).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True if the table holds no rows. Construction guarantees at least
    /// two, so this only exists to pair with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Asset symbols in column order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// The ascending date index.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Closing prices for the asset at `index`.
    #[must_use]
    pub fn closes(&self, index: usize) -> &[f64] {
        &self.closes[index]
    }

    /// Daily returns for the asset at `index`. The first entry is NaN when
    /// the column was derived.
    #[must_use]
    pub fn daily_returns(&self, index: usize) -> &[f64] {
        &self.daily_returns[index]
    }

    /// The most recent closing price per asset, in asset order.
    #[must_use]
    pub fn latest_closes(&self) -> Vec<f64> {
        self.closes
            .iter()
            .map(|col| *col.last().expect("table rows validated non-empty"))
            .collect()
    }

    /// Column index of `symbol`, if present.
    #[must_use]
    pub fn asset_index(&self, symbol: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == symbol)
    }
}

/// Percent change between consecutive values. The first entry is NaN; a zero
/// previous value propagates a non-finite entry rather than erroring.
#[must_use]
pub fn pct_change(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    for (i, value) in series.iter().enumerate() {
        if i == 0 {
            out.push(f64::NAN);
        } else {
            out.push(value / series[i - 1] - 1.0);
        }
    }
    out
}
