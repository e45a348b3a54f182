//! Aligns per-symbol price history on a shared date index.
//!
//! Providers return each symbol's history independently; the analytics and
//! simulation layers need every asset on the same trading dates. The builder
//! inner-joins the series on their common dates, ascending, so no partial
//! row reaches the engine.

use crate::models::PriceRecord;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use coinfolio_core::PriceTable;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{BTreeMap, BTreeSet};

/// Builds a [`PriceTable`] from one record series per symbol, keeping only
/// dates present in every series. When a symbol has multiple records on one
/// date, the latest observation wins.
///
/// # Errors
///
/// Returns an error if no series are supplied, if fewer than two common
/// dates remain after the join, or if table validation fails.
pub fn build_price_table(series: &[(String, Vec<PriceRecord>)]) -> Result<PriceTable> {
    if series.is_empty() {
        anyhow::bail!("portfolio requires at least one symbol's price history");
    }

    let mut by_symbol: Vec<(String, BTreeMap<NaiveDate, f64>)> = Vec::with_capacity(series.len());
    for (symbol, records) in series {
        let mut closes = BTreeMap::new();
        for record in records {
            let close = record
                .close
                .to_f64()
                .with_context(|| format!("close out of f64 range for {symbol}"))?;
            closes.insert(record.timestamp.date_naive(), close);
        }
        by_symbol.push((symbol.clone(), closes));
    }

    // Intersect the date sets across all symbols
    let mut common: BTreeSet<NaiveDate> = by_symbol[0].1.keys().copied().collect();
    for (_, closes) in &by_symbol[1..] {
        let dates: BTreeSet<NaiveDate> = closes.keys().copied().collect();
        common = common.intersection(&dates).copied().collect();
    }

    if common.len() < 2 {
        anyhow::bail!(
            "symbols share only {} trading dates; need at least 2 to derive returns",
            common.len()
        );
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let mut assets = Vec::with_capacity(by_symbol.len());
    let mut columns = Vec::with_capacity(by_symbol.len());
    for (symbol, closes) in by_symbol {
        let column: Vec<f64> = dates.iter().map(|d| closes[d]).collect();
        assets.push(symbol);
        columns.push(column);
    }

    tracing::debug!(
        "built price table: {} assets over {} shared dates",
        assets.len(),
        dates.len()
    );

    Ok(PriceTable::new(dates, assets, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn record(day: u32, symbol: &str, close: rust_decimal::Decimal) -> PriceRecord {
        PriceRecord::new(
            Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            symbol,
            close,
        )
    }

    #[test]
    fn joins_on_common_dates_only() {
        let series = vec![
            (
                "BTC".to_string(),
                vec![
                    record(1, "BTC", dec!(100)),
                    record(2, "BTC", dec!(110)),
                    record(3, "BTC", dec!(120)),
                ],
            ),
            (
                "ETH".to_string(),
                // Missing day 2
                vec![record(1, "ETH", dec!(10)), record(3, "ETH", dec!(12))],
            ),
        ];

        let table = build_price_table(&series).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.closes(0), &[100.0, 120.0]);
        assert_eq!(table.closes(1), &[10.0, 12.0]);
    }

    #[test]
    fn preserves_symbol_order() {
        let series = vec![
            (
                "ETH".to_string(),
                vec![record(1, "ETH", dec!(10)), record(2, "ETH", dec!(11))],
            ),
            (
                "BTC".to_string(),
                vec![record(1, "BTC", dec!(100)), record(2, "BTC", dec!(101))],
            ),
        ];

        let table = build_price_table(&series).unwrap();
        assert_eq!(table.assets(), &["ETH".to_string(), "BTC".to_string()]);
    }

    #[test]
    fn too_few_common_dates_is_an_error() {
        let series = vec![
            ("BTC".to_string(), vec![record(1, "BTC", dec!(100))]),
            ("ETH".to_string(), vec![record(2, "ETH", dec!(10))]),
        ];

        assert!(build_price_table(&series).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(build_price_table(&[]).is_err());
    }
}
