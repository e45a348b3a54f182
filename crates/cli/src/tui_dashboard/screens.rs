use super::{App, AppScreen, PortfolioOutcome};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Chart, Dataset, Gauge, GraphType, List, ListItem,
        Paragraph, Row, Table,
    },
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    match app.current_screen {
        AppScreen::TokenSelection => render_token_selection(f, app),
        AppScreen::TokenAnalysis => render_token_analysis(f, app),
        AppScreen::Running => render_running(f, app),
        AppScreen::PortfolioResults => render_results(f, app),
    }
}

fn render_token_selection(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Token list
            Constraint::Length(2), // Error / hint line
            Constraint::Length(4), // Instructions
        ])
        .split(f.area());

    // Title
    let title = Paragraph::new(format!(
        "Cryptocurrency Analysis ({} in portfolio)",
        app.selected_tokens.len()
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    // Token list
    let items: Vec<ListItem> = app
        .available_tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            let is_selected = app.selected_tokens.contains(token);
            let is_highlighted = i == app.token_scroll_offset;

            let style = if is_highlighted {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };

            let checkbox = if is_selected { "[x]" } else { "[ ]" };
            ListItem::new(format!("{checkbox} {token}")).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Tokens"));
    f.render_widget(list, chunks[1]);

    // Error or hint
    let message = app.error_message.as_deref().unwrap_or(
        "Enter analyzes the highlighted token; select two or more with Space for a portfolio",
    );
    let style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let hint = Paragraph::new(message)
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(hint, chunks[2]);

    // Instructions
    let instructions = Paragraph::new(vec![
        Line::from("↑↓: Navigate | Space: Toggle | a: Select All | n: Deselect All"),
        Line::from("Enter: Analyze Token | p: Analyze Portfolio | q: Quit"),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(instructions, chunks[3]);
}

fn render_token_analysis(f: &mut Frame, app: &App) {
    let Some(analysis) = &app.analysis else {
        let placeholder = Paragraph::new("No analysis loaded")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(placeholder, f.area());
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Charts
            Constraint::Length(3), // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new(format!(
        "{} — close {:.4} USD | Sharpe ratio {:.4}",
        analysis.symbol, analysis.latest_close, analysis.sharpe
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    // 2x2 chart grid
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_line_chart(f, top[0], "Close (USD)", &analysis.closes, Color::Cyan);
    render_line_chart(
        f,
        top[1],
        "30-day rolling mean",
        &analysis.rolling_mean,
        Color::Yellow,
    );
    render_line_chart(
        f,
        bottom[0],
        "Daily percent change",
        &analysis.pct_change,
        Color::Magenta,
    );
    render_line_chart(
        f,
        bottom[1],
        "Cumulative return",
        &analysis.cumulative,
        Color::Green,
    );

    let instructions = Paragraph::new("Esc: Back | q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(instructions, chunks[2]);
}

fn render_running(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Progress gauge
            Constraint::Min(0),    // Status messages
            Constraint::Length(3), // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new("Analyzing Portfolio")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(app.progress.clamp(0.0, 1.0));
    f.render_widget(gauge, chunks[1]);

    let items: Vec<ListItem> = app
        .status_messages
        .iter()
        .map(|m| ListItem::new(m.as_str()))
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(list, chunks[2]);

    let instructions = Paragraph::new("Esc: Back to selection")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(instructions, chunks[3]);
}

fn render_results(f: &mut Frame, app: &App) {
    let Some(outcome) = &app.outcome else {
        let placeholder = Paragraph::new("No portfolio results yet")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(placeholder, f.area());
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Title
            Constraint::Length(5),  // Projection sentence
            Constraint::Min(10),    // Trajectory chart
            Constraint::Length(14), // Histogram / summary / correlation
            Constraint::Length(3),  // Instructions
        ])
        .split(f.area());

    let title = Paragraph::new(format!(
        "Portfolio Projection — {} trials over {} trading days",
        outcome.summary.count, outcome.horizon_days
    ))
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_projection_sentence(f, chunks[1], outcome);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    render_history_chart(f, charts[0], outcome);
    render_trajectory_chart(f, charts[1], outcome);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(chunks[3]);
    render_distribution_histogram(f, bottom[0], outcome);
    render_summary_table(f, bottom[1], outcome);
    render_correlation_table(f, bottom[2], outcome);

    let instructions = Paragraph::new("Esc/b: Back to selection | q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(instructions, chunks[4]);
}

fn render_projection_sentence(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    let weights_line = outcome
        .symbols
        .iter()
        .zip(&outcome.best.weights)
        .map(|(symbol, weight)| format!("{symbol} {weight:.2}"))
        .collect::<Vec<_>>()
        .join(", ");

    let interval = outcome.distribution.confidence_interval;
    let (lower, upper) = interval.scaled(outcome.investment);
    let worst = outcome.summary.min * outcome.investment;

    let text = vec![
        Line::from(format!(
            "Best weights by Sharpe ratio ({:.4}): {weights_line}",
            outcome.best.sharpe_ratio
        )),
        Line::from(format!(
            "There is a 95% chance that an initial investment of ${:.2} ends between ${lower:.2} and ${upper:.2}.",
            outcome.investment
        )),
        Line::from(format!("Worst simulated outcome: ${worst:.2}.")),
    ];

    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_history_chart(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    const PALETTE: [Color; 6] = [
        Color::Cyan,
        Color::Yellow,
        Color::Green,
        Color::Magenta,
        Color::Red,
        Color::Blue,
    ];

    let series: Vec<Vec<(f64, f64)>> = outcome
        .normalized_history
        .iter()
        .map(|column| line_series(column))
        .collect();

    let all: Vec<(f64, f64)> = series.iter().flatten().copied().collect();
    let [y_min, y_max] = value_bounds(&all);
    #[allow(clippy::cast_precision_loss)]
    let x_max = outcome
        .normalized_history
        .first()
        .map_or(1.0, |c| c.len().saturating_sub(1).max(1) as f64);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x_label = format!("{}", x_max as usize);

    let datasets: Vec<Dataset> = outcome
        .symbols
        .iter()
        .zip(&series)
        .enumerate()
        .map(|(i, (symbol, points))| {
            trajectory_dataset(symbol.as_str(), points, PALETTE[i % PALETTE.len()])
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Historical growth (rebased)"),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Span::raw("0"), Span::raw(x_label)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.2}")),
                    Span::raw(format!("{y_max:.2}")),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_trajectory_chart(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    let stats = &outcome.path_stats;
    let mean = line_series(&stats.mean);
    let median = line_series(&stats.median);
    let min = line_series(&stats.min);
    let max = line_series(&stats.max);

    let mut all: Vec<(f64, f64)> = Vec::new();
    all.extend(&mean);
    all.extend(&median);
    all.extend(&min);
    all.extend(&max);
    let [y_min, y_max] = value_bounds(&all);
    #[allow(clippy::cast_precision_loss)]
    let x_max = stats.mean.len().saturating_sub(1).max(1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x_label = format!("{}", x_max as usize);

    let datasets = vec![
        trajectory_dataset("mean", &mean, Color::Cyan),
        trajectory_dataset("median", &median, Color::Yellow),
        trajectory_dataset("min", &min, Color::Red),
        trajectory_dataset("max", &max, Color::Green),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Cumulative return trajectories"),
        )
        .x_axis(
            Axis::default()
                .title("trading day")
                .bounds([0.0, x_max])
                .labels(vec![Span::raw("0"), Span::raw(x_label)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.2}")),
                    Span::raw(format!("{:.2}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{y_max:.2}")),
                ]),
        );
    f.render_widget(chart, area);
}

fn trajectory_dataset<'a>(
    name: &'a str,
    points: &'a [(f64, f64)],
    color: Color,
) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points)
}

fn render_distribution_histogram(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    let bins = histogram_bins(&outcome.distribution.values, 10);
    let data: Vec<(&str, u64)> = bins.iter().map(|(label, count)| (label.as_str(), *count)).collect();

    let interval = outcome.distribution.confidence_interval;
    let chart = BarChart::default()
        .block(
            Block::default().borders(Borders::ALL).title(format!(
                "Final returns (95% CI [{:.3}, {:.3}])",
                interval.lower, interval.upper
            )),
        )
        .data(&data)
        .bar_width(6)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, area);
}

fn render_summary_table(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    let rows: Vec<Row> = outcome
        .summary
        .rows()
        .into_iter()
        .map(|(label, value)| Row::new(vec![label.to_string(), format!("{value:.4}")]))
        .collect();

    let table = Table::new(rows, [Constraint::Length(14), Constraint::Length(12)])
        .header(
            Row::new(vec!["statistic", "value"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(table, area);
}

fn render_correlation_table(f: &mut Frame, area: Rect, outcome: &PortfolioOutcome) {
    let mut header = vec![String::new()];
    header.extend(outcome.symbols.iter().cloned());

    let rows: Vec<Row> = outcome
        .symbols
        .iter()
        .zip(&outcome.correlation)
        .map(|(symbol, row)| {
            let mut cells = vec![symbol.clone()];
            cells.extend(row.iter().map(|v| format!("{v:.2}")));
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(6))
        .chain(outcome.symbols.iter().map(|_| Constraint::Length(6)))
        .collect();

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Daily return correlation"),
        );
    f.render_widget(table, area);
}

fn render_line_chart(f: &mut Frame, area: Rect, title: &str, series: &[f64], color: Color) {
    let points = line_series(series);
    let [y_min, y_max] = value_bounds(&points);
    #[allow(clippy::cast_precision_loss)]
    let x_max = series.len().saturating_sub(1).max(1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let x_label = format!("{}", x_max as usize);

    let datasets = vec![Dataset::default()
        .name(title)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Span::raw("0"), Span::raw(x_label)]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.2}")),
                    Span::raw(format!("{y_max:.2}")),
                ]),
        );
    f.render_widget(chart, area);
}

/// Series indexed by position, non-finite entries (leading NaN) dropped
fn line_series(series: &[f64]) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f64;
            (x, *v)
        })
        .collect()
}

/// Y bounds with a little padding so flat series still render
fn value_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    if points.is_empty() {
        return [0.0, 1.0];
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (_, v) in points {
        min = min.min(*v);
        max = max.max(*v);
    }

    if (max - min).abs() < f64::EPSILON {
        [min - 0.5, max + 0.5]
    } else {
        let pad = (max - min) * 0.05;
        [min - pad, max + pad]
    }
}

/// Buckets values into `bins` equal-width ranges labeled by lower bound
fn histogram_bins(values: &[f64], bins: usize) -> Vec<(String, u64)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }

    if (max - min).abs() < f64::EPSILON {
        return vec![(format!("{min:.2}"), values.len() as u64)];
    }

    #[allow(clippy::cast_precision_loss)]
    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for v in values {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (((v - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            #[allow(clippy::cast_precision_loss)]
            let lower = min + width * i as f64;
            (format!("{lower:.2}"), count)
        })
        .collect()
}
