mod runner;
mod screens;

use anyhow::Result;
use coinfolio_analytics::FrontierPoint;
use coinfolio_core::AppConfig;
use coinfolio_simulation::{FinalDistribution, PathStats, ReturnSummary};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::collections::HashSet;
use std::io;

/// Single-token analysis data backing the charts screen
pub struct TokenAnalysis {
    pub symbol: String,
    pub closes: Vec<f64>,
    pub rolling_mean: Vec<f64>,
    pub pct_change: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub sharpe: f64,
    pub latest_close: f64,
}

/// Portfolio pipeline outcome backing the results screen
pub struct PortfolioOutcome {
    pub symbols: Vec<String>,
    pub best: FrontierPoint,
    pub correlation: Vec<Vec<f64>>,
    /// Per-symbol close history rebased to its first shared date
    pub normalized_history: Vec<Vec<f64>>,
    pub path_stats: PathStats,
    pub distribution: FinalDistribution,
    pub summary: ReturnSummary,
    pub investment: f64,
    pub horizon_days: usize,
}

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    TokenSelection,
    TokenAnalysis,
    Running,
    PortfolioResults,
}

/// Main application state
pub struct App {
    pub config: AppConfig,
    pub current_screen: AppScreen,
    pub should_quit: bool,

    // Token selection
    pub available_tokens: Vec<String>,
    pub selected_tokens: HashSet<String>,
    pub token_scroll_offset: usize,
    pub pending_analysis: Option<String>,
    pub error_message: Option<String>,

    // Single-token analysis
    pub analysis: Option<TokenAnalysis>,

    // Running state
    pub progress: f64,
    pub status_messages: Vec<String>,

    // Results
    pub outcome: Option<PortfolioOutcome>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            available_tokens: config.dashboard.tokens.clone(),
            config,
            current_screen: AppScreen::TokenSelection,
            should_quit: false,

            selected_tokens: HashSet::new(),
            token_scroll_offset: 0,
            pending_analysis: None,
            error_message: None,

            analysis: None,

            progress: 0.0,
            status_messages: Vec::new(),

            outcome: None,
        }
    }

    /// Selected symbols in display order, the order the table's assets get
    #[must_use]
    pub fn selected_in_order(&self) -> Vec<String> {
        self.available_tokens
            .iter()
            .filter(|t| self.selected_tokens.contains(*t))
            .cloned()
            .collect()
    }

    /// Handle keyboard input based on current screen
    pub fn handle_key(&mut self, key: KeyCode) {
        match self.current_screen {
            AppScreen::TokenSelection => self.handle_selection_key(key),
            AppScreen::TokenAnalysis => self.handle_analysis_key(key),
            AppScreen::Running => self.handle_running_key(key),
            AppScreen::PortfolioResults => self.handle_results_key(key),
        }
    }

    /// Add a status message (keeps last 10 messages)
    pub fn add_status(&mut self, message: String) {
        self.status_messages.push(message);
        if self.status_messages.len() > 10 {
            self.status_messages.remove(0);
        }
    }

    fn handle_selection_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.token_scroll_offset > 0 {
                    self.token_scroll_offset -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.token_scroll_offset < self.available_tokens.len().saturating_sub(1) {
                    self.token_scroll_offset += 1;
                }
            }
            KeyCode::Char(' ') => {
                // Toggle portfolio membership of the highlighted token
                if let Some(token) = self.available_tokens.get(self.token_scroll_offset) {
                    if self.selected_tokens.contains(token) {
                        self.selected_tokens.remove(token);
                    } else {
                        self.selected_tokens.insert(token.clone());
                    }
                }
            }
            KeyCode::Char('a') => {
                self.selected_tokens = self.available_tokens.iter().cloned().collect();
            }
            KeyCode::Char('n') => {
                self.selected_tokens.clear();
            }
            KeyCode::Enter => {
                // Analyze the highlighted token
                if let Some(token) = self.available_tokens.get(self.token_scroll_offset) {
                    self.pending_analysis = Some(token.clone());
                }
            }
            KeyCode::Char('p') => {
                // Portfolio analysis needs at least two tokens
                if self.selected_tokens.len() >= 2 {
                    self.outcome = None;
                    self.progress = 0.0;
                    self.status_messages.clear();
                    self.error_message = None;
                    self.current_screen = AppScreen::Running;
                } else {
                    self.error_message =
                        Some("Select at least two tokens (Space) before pressing p".to_string());
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_analysis_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Backspace => {
                self.current_screen = AppScreen::TokenSelection;
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_running_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                // Abandon the run view; the pipeline finishes in the background
                self.current_screen = AppScreen::TokenSelection;
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('b') => {
                self.current_screen = AppScreen::TokenSelection;
                self.outcome = None;
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }
}

/// Main entry point for TUI application
pub async fn run() -> Result<()> {
    let config = coinfolio_core::ConfigLoader::load()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // Run app loop
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| screens::render(f, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        // Launch a pending single-token analysis
        if let Some(symbol) = app.pending_analysis.take() {
            app.add_status(format!("Fetching {symbol} history..."));
            let _ = terminal.draw(|f| screens::render(f, app));

            match runner::load_token_analysis(&app.config, &symbol).await {
                Ok(analysis) => {
                    app.analysis = Some(analysis);
                    app.error_message = None;
                    app.current_screen = AppScreen::TokenAnalysis;
                }
                Err(e) => {
                    app.error_message = Some(format!("Failed to analyze {symbol}: {e}"));
                    app.current_screen = AppScreen::TokenSelection;
                }
            }
        }

        // Run the portfolio pipeline when entering the running screen
        if app.current_screen == AppScreen::Running && app.outcome.is_none() {
            let symbols = app.selected_in_order();
            let config = app.config.clone();

            let result = runner::run_portfolio_analysis(&config, &symbols, |status, fraction| {
                app.progress = fraction;
                if let Some(msg) = status {
                    app.add_status(msg);
                }

                // Force redraw
                let _ = terminal.draw(|f| screens::render(f, app));
            })
            .await;

            match result {
                Ok(outcome) => {
                    app.outcome = Some(outcome);
                    app.current_screen = AppScreen::PortfolioResults;
                }
                Err(e) => {
                    app.error_message = Some(format!("Portfolio analysis failed: {e}"));
                    app.current_screen = AppScreen::TokenSelection;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
