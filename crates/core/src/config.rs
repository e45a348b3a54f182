use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
    pub simulation: SimulationDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub api_url: String,
    pub cache_dir: String,
    pub history_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub tokens: Vec<String>,
    pub investment_amount: f64,
}

/// Defaults used by the dashboard's portfolio projection. The engine itself
/// defaults to 1000 trials over 252 days; the dashboard projects five years
/// with fewer trials to stay responsive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationDefaults {
    pub num_simulations: usize,
    pub num_trading_days: usize,
    pub num_portfolios: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                api_url: "https://api.coingecko.com/api/v3".to_string(),
                cache_dir: "data/cache".to_string(),
                history_days: 365,
            },
            dashboard: DashboardConfig {
                tokens: [
                    "BTC", "ETH", "DOT", "ADA", "LINK", "XRP", "BNB", "DOGE", "UNI", "BCH",
                    "MATIC", "XLM", "SOL", "VET", "ETC", "EOS", "TRX", "FIL", "XMR", "AAVE",
                ]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
                investment_amount: 50_000.0,
            },
            simulation: SimulationDefaults {
                num_simulations: 250,
                num_trading_days: 252 * 5,
                num_portfolios: 1000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lists_twenty_tokens() {
        let config = AppConfig::default();
        assert_eq!(config.dashboard.tokens.len(), 20);
        assert_eq!(config.dashboard.tokens[0], "BTC");
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = AppConfig::default();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.data.api_url, config.data.api_url);
        assert_eq!(
            deserialized.simulation.num_trading_days,
            config.simulation.num_trading_days
        );
        assert_eq!(deserialized.dashboard.tokens, config.dashboard.tokens);
    }
}
