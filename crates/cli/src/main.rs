use clap::{Parser, Subcommand};

mod tui_dashboard;

#[derive(Parser)]
#[command(name = "coinfolio")]
#[command(about = "Cryptocurrency portfolio analysis dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive analysis dashboard
    Dashboard {
        /// Optional log file path (logs to file instead of stderr)
        #[arg(long)]
        log_file: Option<String>,
    },
    /// Fetch daily closing prices and write them to a CSV cache file
    FetchData {
        /// Token symbol (e.g., "BTC", "ETH")
        #[arg(long)]
        symbol: String,
        /// Days of history to fetch
        #[arg(long, default_value_t = 365)]
        days: u32,
        /// Output CSV file path
        #[arg(short, long)]
        output: String,
    },
    /// Print descriptive statistics for a single token
    Analyze {
        /// Token symbol (e.g., "BTC", "ETH")
        #[arg(long)]
        symbol: String,
        /// Days of history to fetch
        #[arg(long, default_value_t = 365)]
        days: u32,
        /// Rolling-mean window in trading days
        #[arg(long, default_value_t = 30)]
        window: usize,
    },
    /// Search portfolio weights and project future returns
    Portfolio {
        /// Token symbols, at least two (e.g., --symbols BTC,ETH,SOL)
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        symbols: Vec<String>,
        /// Explicit weights in symbol order (skips the random search)
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        weights: Option<Vec<f64>>,
        /// Number of simulation trials (defaults from config)
        #[arg(long)]
        simulations: Option<usize>,
        /// Trading days to simulate (defaults from config)
        #[arg(long)]
        horizon: Option<usize>,
        /// Days of price history to fetch
        #[arg(long, default_value_t = 365)]
        history_days: u32,
        /// Seed for reproducible search and simulation
        #[arg(long)]
        seed: Option<u64>,
        /// Investment amount used to scale the confidence bounds
        #[arg(long)]
        investment: Option<f64>,
        /// Emit the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (disabled for TUI to prevent screen corruption, unless log_file is provided)
    match &cli.command {
        Commands::Dashboard {
            log_file: Some(path),
        } => {
            // Log to file for TUI
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        Commands::Dashboard { .. } => {
            // No logging for TUI (prevents screen corruption)
        }
        _ => {
            // Normal stderr logging for non-TUI commands
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .init();
        }
    }

    match cli.command {
        Commands::Dashboard { log_file: _ } => {
            tui_dashboard::run().await?;
        }
        Commands::FetchData {
            symbol,
            days,
            output,
        } => {
            run_fetch_data(&symbol, days, &output).await?;
        }
        Commands::Analyze {
            symbol,
            days,
            window,
        } => {
            run_analyze(&symbol, days, window).await?;
        }
        Commands::Portfolio {
            symbols,
            weights,
            simulations,
            horizon,
            history_days,
            seed,
            investment,
            json,
        } => {
            run_portfolio(
                &symbols,
                weights,
                simulations,
                horizon,
                history_days,
                seed,
                investment,
                json,
            )
            .await?;
        }
    }

    Ok(())
}

async fn run_fetch_data(symbol: &str, days: u32, output_path: &str) -> anyhow::Result<()> {
    use coinfolio_data::{CsvStorage, MarketDataClient};

    tracing::info!("Fetching {} days of daily closes for {}", days, symbol);

    let config = coinfolio_core::ConfigLoader::load()?;
    let client = MarketDataClient::new(config.data.api_url);

    let records = client.fetch_daily_closes(symbol, days).await?;

    if records.is_empty() {
        tracing::warn!("No price data returned. Symbol may not exist.");
        anyhow::bail!("No data fetched for {symbol}");
    }

    tracing::info!(
        "Fetched {} daily closes, writing to {}",
        records.len(),
        output_path
    );

    CsvStorage::write_prices(output_path, &records)?;

    tracing::info!(
        "✅ Successfully wrote {} rows to {}",
        records.len(),
        output_path
    );
    tracing::info!(
        "You can now run: coinfolio analyze --symbol {} or coinfolio portfolio --symbols {},<other>",
        symbol,
        symbol
    );

    Ok(())
}

async fn run_analyze(symbol: &str, days: u32, window: usize) -> anyhow::Result<()> {
    use coinfolio_analytics::{cumulative_returns, rolling_mean, sharpe_ratio};
    use coinfolio_core::pct_change;
    use coinfolio_data::MarketDataClient;
    use rust_decimal::prelude::ToPrimitive;

    tracing::info!("Analyzing {} over {} days", symbol, days);

    let config = coinfolio_core::ConfigLoader::load()?;
    let client = MarketDataClient::new(config.data.api_url);

    let records = client.fetch_daily_closes(symbol, days).await?;
    let closes: Vec<f64> = records
        .iter()
        .map(|r| r.close.to_f64().unwrap_or(0.0))
        .collect();

    let changes = pct_change(&closes);
    let sharpe = sharpe_ratio(&changes);
    let cumulative = cumulative_returns(&changes);
    let rolling = rolling_mean(&closes, window);

    println!("\n{}", "=".repeat(60));
    println!("Analysis: {symbol} ({} trading days)", closes.len());
    println!("{}", "=".repeat(60));
    println!("{:<28} {:>18.4}", "Latest close (USD)", closes.last().unwrap_or(&0.0));
    println!(
        "{:<28} {:>18.4}",
        format!("{window}-day rolling mean"),
        rolling.iter().rev().find(|v| v.is_finite()).unwrap_or(&f64::NAN)
    );
    println!(
        "{:<28} {:>17.2}%",
        "Cumulative return",
        cumulative.last().unwrap_or(&0.0) * 100.0
    );
    println!("{:<28} {:>18.4}", "Sharpe ratio (annualized)", sharpe);
    println!("{}", "=".repeat(60));

    Ok(())
}

#[allow(clippy::too_many_arguments, clippy::cognitive_complexity)]
async fn run_portfolio(
    symbols: &[String],
    weights: Option<Vec<f64>>,
    simulations: Option<usize>,
    horizon: Option<usize>,
    history_days: u32,
    seed: Option<u64>,
    investment: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    use coinfolio_analytics::{search, FrontierConfig};
    use coinfolio_data::{build_price_table, MarketDataClient};
    use coinfolio_simulation::{MonteCarloSimulator, SimulationConfig};
    use rust_decimal::Decimal;

    if symbols.len() < 2 {
        anyhow::bail!("Portfolio analysis needs at least two symbols");
    }

    let config = coinfolio_core::ConfigLoader::load()?;
    let client = MarketDataClient::new(config.data.api_url.clone());

    let series = client.fetch_portfolio(symbols, history_days).await?;
    let table = build_price_table(&series)?;

    // Use the supplied weights, or search for the best-Sharpe draw
    let weights = match weights {
        Some(weights) => weights,
        None => {
            let mut frontier_config = FrontierConfig::new(config.simulation.num_portfolios);
            if let Some(seed) = seed {
                frontier_config = frontier_config.with_seed(seed);
            }

            tracing::info!(
                "Searching {} random weight vectors",
                frontier_config.num_portfolios
            );
            let result = search(&table, &frontier_config)?;

            println!("\nBest weights by Sharpe ratio ({:.4}):", result.best.sharpe_ratio);
            for (symbol, weight) in table.assets().iter().zip(&result.best.weights) {
                println!("  {symbol:<8} {weight:>7.2}");
            }
            result.best.weights
        }
    };

    let mut sim_config = SimulationConfig::new(
        simulations.unwrap_or(config.simulation.num_simulations),
        horizon.unwrap_or(config.simulation.num_trading_days),
    );
    if let Some(seed) = seed {
        sim_config = sim_config.with_seed(seed);
    }

    tracing::info!(
        "Simulating {} trials over {} trading days",
        sim_config.num_simulations,
        sim_config.num_trading_days
    );

    let mut simulator = MonteCarloSimulator::new(table, Some(weights), sim_config)?;
    let summary = simulator.summarize();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(44));
    println!("Simulated final cumulative returns");
    println!("{}", "=".repeat(44));
    for (label, value) in summary.rows() {
        println!("{label:<16} {value:>16.6}");
    }
    println!("{}", "=".repeat(44));

    let investment = investment.unwrap_or(config.dashboard.investment_amount);
    let interval = simulator.confidence_interval();
    let (lower, upper) = interval.scaled(investment);
    let lower = Decimal::try_from(lower).unwrap_or(Decimal::ZERO).round_dp(2);
    let upper = Decimal::try_from(upper).unwrap_or(Decimal::ZERO).round_dp(2);

    println!(
        "\nThere is a 95% chance that an initial investment of ${investment:.2} \
         will end within the range of ${lower} and ${upper} after {} trading days.",
        simulator.config().num_trading_days
    );

    Ok(())
}
