use crate::models::{MarketChartResponse, PriceRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use reqwest::Client;
use rust_decimal::Decimal;
use std::num::NonZeroU32;
use std::sync::Arc;

pub struct MarketDataClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl MarketDataClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        // Public API allows ~30 calls per minute
        let quota = Quota::per_minute(NonZeroU32::new(30).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http_client: Client::new(),
            base_url,
            rate_limiter,
        }
    }

    /// Fetches up to `days` of daily closing prices for a token symbol,
    /// returned in ascending date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the payload does not parse, or
    /// the provider returns no prices for the symbol.
    pub async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> Result<Vec<PriceRecord>> {
        self.rate_limiter.until_ready().await;

        let coin_id = coin_id_for_symbol(symbol);
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}&interval=daily",
            self.base_url, coin_id, days
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request for {symbol} history failed"))?
            .error_for_status()
            .with_context(|| format!("provider rejected {symbol} history request"))?;

        let chart: MarketChartResponse = response
            .json()
            .await
            .with_context(|| format!("malformed market chart payload for {symbol}"))?;

        if chart.prices.is_empty() {
            anyhow::bail!("no price history returned for {symbol}");
        }

        let mut records = Vec::with_capacity(chart.prices.len());
        for (millis, price) in chart.prices {
            #[allow(clippy::cast_possible_truncation)]
            let timestamp = DateTime::<Utc>::from_timestamp_millis(millis as i64)
                .with_context(|| format!("invalid timestamp {millis} for {symbol}"))?;
            let close = Decimal::try_from(price)
                .with_context(|| format!("unrepresentable price {price} for {symbol}"))?;
            records.push(PriceRecord::new(timestamp, symbol, close));
        }

        records.sort_by_key(|r| r.timestamp);

        tracing::debug!("fetched {} daily closes for {}", records.len(), symbol);
        Ok(records)
    }

    /// Fetches daily closes for several symbols sequentially through the
    /// rate limiter, preserving the requested symbol order.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error encountered.
    pub async fn fetch_portfolio(
        &self,
        symbols: &[String],
        days: u32,
    ) -> Result<Vec<(String, Vec<PriceRecord>)>> {
        let mut series = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            tracing::info!("fetching {} daily closes for {}", days, symbol);
            let records = self.fetch_daily_closes(symbol, days).await?;
            series.push((symbol.clone(), records));
        }
        Ok(series)
    }
}

/// Maps a ticker symbol to the provider's coin identifier. Unknown symbols
/// fall back to the lowercased ticker, which the provider accepts for many
/// smaller listings.
#[must_use]
pub fn coin_id_for_symbol(symbol: &str) -> String {
    match symbol.to_ascii_uppercase().as_str() {
        "BTC" => "bitcoin".to_string(),
        "ETH" => "ethereum".to_string(),
        "DOT" => "polkadot".to_string(),
        "ADA" => "cardano".to_string(),
        "LINK" => "chainlink".to_string(),
        "XRP" => "ripple".to_string(),
        "BNB" => "binancecoin".to_string(),
        "DOGE" => "dogecoin".to_string(),
        "UNI" => "uniswap".to_string(),
        "BCH" => "bitcoin-cash".to_string(),
        "MATIC" => "matic-network".to_string(),
        "XLM" => "stellar".to_string(),
        "SOL" => "solana".to_string(),
        "VET" => "vechain".to_string(),
        "ETC" => "ethereum-classic".to_string(),
        "EOS" => "eos".to_string(),
        "TRX" => "tron".to_string(),
        "FIL" => "filecoin".to_string(),
        "XMR" => "monero".to_string(),
        "AAVE" => "aave".to_string(),
        other => other.to_ascii_lowercase(),
    }
}
