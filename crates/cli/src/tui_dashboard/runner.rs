use super::{PortfolioOutcome, TokenAnalysis};
use anyhow::Result;
use coinfolio_analytics::{
    correlation_matrix, cumulative_returns, normalized, rolling_mean, search, sharpe_ratio,
    FrontierConfig,
};
use coinfolio_core::{pct_change, AppConfig};
use coinfolio_data::{build_price_table, MarketDataClient};
use coinfolio_simulation::{MonteCarloSimulator, SimulationConfig};
use rust_decimal::prelude::ToPrimitive;

const ROLLING_WINDOW_DAYS: usize = 30;

/// Fetches one token's history and derives the chart series for the
/// analysis screen.
///
/// # Errors
/// Returns error if the fetch fails or no usable history comes back
pub async fn load_token_analysis(config: &AppConfig, symbol: &str) -> Result<TokenAnalysis> {
    let client = MarketDataClient::new(config.data.api_url.clone());
    let records = client
        .fetch_daily_closes(symbol, config.data.history_days)
        .await?;

    let closes: Vec<f64> = records
        .iter()
        .map(|r| r.close.to_f64().unwrap_or(0.0))
        .collect();
    let changes = pct_change(&closes);

    Ok(TokenAnalysis {
        symbol: symbol.to_string(),
        rolling_mean: rolling_mean(&closes, ROLLING_WINDOW_DAYS),
        cumulative: cumulative_returns(&changes),
        sharpe: sharpe_ratio(&changes),
        latest_close: closes.last().copied().unwrap_or(0.0),
        pct_change: changes,
        closes,
    })
}

/// Runs the full portfolio pipeline: fetch every symbol, align the table,
/// search weights, simulate, and package the results for display.
/// `on_progress` receives an optional status message and a completion
/// fraction in [0, 1].
///
/// # Errors
/// Returns error if any fetch fails, the symbols share too few dates, or
/// the weight search cannot run
#[allow(clippy::cast_precision_loss)]
pub async fn run_portfolio_analysis(
    config: &AppConfig,
    symbols: &[String],
    mut on_progress: impl FnMut(Option<String>, f64),
) -> Result<PortfolioOutcome> {
    let client = MarketDataClient::new(config.data.api_url.clone());

    let mut series = Vec::with_capacity(symbols.len());
    for (i, symbol) in symbols.iter().enumerate() {
        on_progress(
            Some(format!("Fetching {symbol} history...")),
            0.4 * (i as f64 / symbols.len() as f64),
        );
        let records = client
            .fetch_daily_closes(symbol, config.data.history_days)
            .await?;
        series.push((symbol.clone(), records));
    }

    let table = build_price_table(&series)?;
    let correlation = correlation_matrix(&table);
    let normalized_history: Vec<Vec<f64>> = (0..table.num_assets())
        .map(|i| normalized(table.closes(i)))
        .collect();

    on_progress(
        Some(format!(
            "Scoring {} random weight vectors...",
            config.simulation.num_portfolios
        )),
        0.45,
    );
    let frontier = search(&table, &FrontierConfig::new(config.simulation.num_portfolios))?;
    let best = frontier.best.clone();

    on_progress(
        Some(format!(
            "Simulating {} trials over {} trading days...",
            config.simulation.num_simulations, config.simulation.num_trading_days
        )),
        0.5,
    );
    let sim_config = SimulationConfig::new(
        config.simulation.num_simulations,
        config.simulation.num_trading_days,
    );
    let mut simulator = MonteCarloSimulator::new(table, Some(best.weights.clone()), sim_config)?;

    simulator.run_with_progress(|completed, total| {
        if completed % 10 == 0 || completed == total {
            on_progress(None, 0.5 + 0.5 * completed as f64 / total as f64);
        }
    });

    let summary = simulator.summarize();
    let path_stats = simulator.path_stats();
    let distribution = simulator.final_distribution();

    Ok(PortfolioOutcome {
        symbols: symbols.to_vec(),
        best,
        correlation,
        normalized_history,
        path_stats,
        distribution,
        summary,
        investment: config.dashboard.investment_amount,
        horizon_days: config.simulation.num_trading_days,
    })
}
