use crate::models::PriceRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub struct CsvStorage;

impl CsvStorage {
    /// Writes price records to a CSV cache file.
    ///
    /// Format: timestamp,symbol,close
    ///
    /// # Errors
    /// Returns error if the file cannot be created or writing fails
    pub fn write_prices(path: &str, records: &[PriceRecord]) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path))?;
        let mut writer = Writer::from_writer(file);

        // Write header
        writer.write_record(["timestamp", "symbol", "close"])?;

        // Sort records by timestamp (ascending) so the newest row is last
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.timestamp);

        for record in sorted {
            writer.write_record(&[
                record.timestamp.to_rfc3339(), // ISO 8601 format
                record.symbol.clone(),
                record.close.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Reads price records from a CSV cache file, returned in ascending
    /// timestamp order. Mixed-symbol files are fine; callers group rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a row fails to
    /// parse.
    pub fn read_prices(path: &str) -> Result<Vec<PriceRecord>> {
        let mut reader = csv::Reader::from_path(Path::new(path))
            .with_context(|| format!("Failed to open CSV file: {}", path))?;
        let mut records = Vec::new();

        for result in reader.records() {
            let record = result?;
            let timestamp: DateTime<Utc> = record[0]
                .parse()
                .with_context(|| format!("invalid timestamp in {}: {}", path, &record[0]))?;
            let symbol = record[1].to_string();
            let close = Decimal::from_str(&record[2])
                .with_context(|| format!("invalid close in {}: {}", path, &record[2]))?;

            records.push(PriceRecord::new(timestamp, symbol, close));
        }

        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(day: u32, symbol: &str, close: Decimal) -> PriceRecord {
        PriceRecord::new(
            Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap(),
            symbol,
            close,
        )
    }

    #[test]
    fn round_trip_preserves_records_and_sorts_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let path = path.to_str().unwrap();

        // Newest-first on purpose
        let records = vec![
            record(3, "BTC", dec!(69000.5)),
            record(1, "BTC", dec!(67000)),
            record(2, "BTC", dec!(68000.25)),
        ];

        CsvStorage::write_prices(path, &records).unwrap();
        let loaded = CsvStorage::read_prices(path).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], record(1, "BTC", dec!(67000)));
        assert_eq!(loaded[2], record(3, "BTC", dec!(69000.5)));
    }

    #[test]
    fn mixed_symbol_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        let path = path.to_str().unwrap();

        let records = vec![record(1, "BTC", dec!(67000)), record(1, "ETH", dec!(3500))];
        CsvStorage::write_prices(path, &records).unwrap();

        let loaded = CsvStorage::read_prices(path).unwrap();
        let symbols: Vec<&str> = loaded.iter().map(|r| r.symbol.as_str()).collect();
        assert!(symbols.contains(&"BTC"));
        assert!(symbols.contains(&"ETH"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(CsvStorage::read_prices("/nonexistent/prices.csv").is_err());
    }
}
