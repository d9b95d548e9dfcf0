// src/tui/mod.rs
use crate::types::{
    Balances, BookLevel, ChartSnapshot, EventKind, TradeEvent, TradePoint, UiEvent,
};
use crate::utils::format::fmt_opt;
use crossterm::{
    cursor::Show,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use std::{io, time::Duration};
use tokio::sync::mpsc;

const MAX_LINES: usize = 20;

pub struct App {
    pub symbol: String,
    pub chart: ChartSnapshot,
    pub balances: Option<Balances>,
    pub trades: Vec<String>,
    pub logs: Vec<String>,
}

fn push_capped(lines: &mut Vec<String>, line: String) {
    lines.push(line);
    if lines.len() > MAX_LINES {
        lines.remove(0);
    }
}

fn trade_line(event: &TradeEvent) -> String {
    format!(
        "{} {} @ {:.2} ({})",
        event.timestamp.format("%H:%M:%S"),
        event.kind,
        event.price,
        event.fill.quantity.round_dp(6)
    )
}

impl App {
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            chart: ChartSnapshot::default(),
            balances: None,
            trades: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Chart(chart) => self.chart = *chart,
            UiEvent::Balances(balances) => self.balances = Some(balances),
            UiEvent::Trade(event) => push_capped(&mut self.trades, trade_line(&event)),
            UiEvent::Log(msg) => push_capped(&mut self.logs, msg),
        }
    }

    pub fn current_price(&self) -> Option<f64> {
        self.chart.closes.last().copied()
    }
}

/// Restores the terminal on every exit path, including early `?` returns.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show);
    }
}

/// Raw mode swallows SIGINT, so Ctrl+C arrives here as a key press.
fn should_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Blocking render loop. Run it on a blocking thread; returns on `q` or
/// Ctrl+C, or once the engine drops its sender.
pub fn run(mut rx: mpsc::Receiver<UiEvent>, symbol: String) -> anyhow::Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(symbol);

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if should_quit(&key) {
                    break;
                }
            }
        }

        let mut engine_gone = false;
        loop {
            match rx.try_recv() {
                Ok(event) => app.on_event(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    engine_gone = true;
                    break;
                }
            }
        }
        if engine_gone {
            break;
        }
    }

    Ok(())
}

/// `(index, value)` pairs for every tick where `pick` yields a value.
fn series<F>(chart: &ChartSnapshot, pick: F) -> Vec<(f64, f64)>
where
    F: Fn(usize) -> Option<f64>,
{
    (0..chart.closes.len())
        .filter_map(|i| pick(i).map(|v| (i as f64, v)))
        .collect()
}

/// Places trade markers on the x axis by matching their timestamps.
fn markers(chart: &ChartSnapshot, points: &[TradePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| {
            chart
                .timestamps
                .iter()
                .position(|t| *t == p.timestamp)
                .map(|i| (i as f64, p.price))
        })
        .collect()
}

fn bounds(sets: &[&[(f64, f64)]]) -> [f64; 2] {
    let (lo, hi) = sets
        .iter()
        .flat_map(|s| s.iter().map(|(_, y)| *y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(hi.abs() * 1e-4).max(1e-9);
    [lo - pad, hi + pad]
}

fn axis_labels(range: [f64; 2], decimals: usize) -> Vec<Span<'static>> {
    let mid = (range[0] + range[1]) / 2.0;
    [range[0], mid, range[1]]
        .into_iter()
        .map(|v| Span::raw(format!("{:.*}", decimals, v)))
        .collect()
}

fn x_bounds(chart: &ChartSnapshot) -> [f64; 2] {
    [0.0, chart.closes.len().saturating_sub(1).max(1) as f64]
}

/// Horizontal reference line across the x range.
fn level(x: [f64; 2], y: f64) -> Vec<(f64, f64)> {
    vec![(x[0], y), (x[1], y)]
}

/// `(price, cumulative quantity)` walking away from the best level.
fn depth_curve(levels: &[BookLevel]) -> Vec<(f64, f64)> {
    let mut total = 0.0;
    levels
        .iter()
        .filter_map(|l| {
            let price = l.price.to_f64()?;
            total += l.quantity.to_f64()?.max(0.0);
            Some((price, total))
        })
        .collect()
}

fn render_price_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let closes = series(chart, |i| Some(chart.closes[i]));
    let upper = series(chart, |i| chart.frames[i].boll_upper);
    let mid = series(chart, |i| chart.frames[i].boll_mid);
    let lower = series(chart, |i| chart.frames[i].boll_lower);
    let buys = markers(chart, &chart.buy_points);
    let sells = markers(chart, &chart.sell_points);

    let y = bounds(&[&closes, &upper, &lower]);
    let datasets = vec![
        Dataset::default()
            .name("price")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&closes),
        Dataset::default()
            .name("boll")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&upper),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Gray))
            .data(&mid),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&lower),
        Dataset::default()
            .name("buy")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Green))
            .data(&buys),
        Dataset::default()
            .name("sell")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&sells),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Price"))
        .x_axis(Axis::default().bounds(x_bounds(chart)))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 2)));
    f.render_widget(widget, area);
}

fn render_rsi_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let rsi = series(chart, |i| chart.frames[i].rsi);
    let x = x_bounds(chart);
    let overbought = level(x, 70.0);
    let oversold = level(x, 30.0);

    let datasets = vec![
        Dataset::default()
            .name("RSI")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&rsi),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&overbought),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&oversold),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("RSI"))
        .x_axis(Axis::default().bounds(x))
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(axis_labels([0.0, 100.0], 0)),
        );
    f.render_widget(widget, area);
}

fn render_macd_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let macd = series(chart, |i| chart.frames[i].macd);
    let signal = series(chart, |i| chart.frames[i].signal);
    let y = bounds(&[&macd, &signal]);

    let datasets = vec![
        Dataset::default()
            .name("MACD")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&macd),
        Dataset::default()
            .name("signal")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&signal),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("MACD"))
        .x_axis(Axis::default().bounds(x_bounds(chart)))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 3)));
    f.render_widget(widget, area);
}

fn render_stochastic_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let k = series(chart, |i| chart.frames[i].stoch_k);
    let d = series(chart, |i| chart.frames[i].stoch_d);
    let x = x_bounds(chart);
    let upper = level(x, 80.0);
    let lower = level(x, 20.0);

    let datasets = vec![
        Dataset::default()
            .name("%K")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::LightRed))
            .data(&k),
        Dataset::default()
            .name("%D")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::LightMagenta))
            .data(&d),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&upper),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&lower),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Stochastic"))
        .x_axis(Axis::default().bounds(x))
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(axis_labels([0.0, 100.0], 0)),
        );
    f.render_widget(widget, area);
}

/// CCI and ADX share one y axis; the +/-100 CCI bands keep ADX (0..100) in view.
fn render_cci_adx_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let cci = series(chart, |i| chart.frames[i].cci);
    let adx = series(chart, |i| chart.frames[i].adx);
    let x = x_bounds(chart);
    let upper = level(x, 100.0);
    let lower = level(x, -100.0);
    let y = bounds(&[&cci, &adx, &upper, &lower]);

    let datasets = vec![
        Dataset::default()
            .name("CCI")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::LightCyan))
            .data(&cci),
        Dataset::default()
            .name("ADX")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&adx),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&upper),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&lower),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("CCI & ADX"))
        .x_axis(Axis::default().bounds(x))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 0)));
    f.render_widget(widget, area);
}

fn render_depth_chart(f: &mut ratatui::Frame, area: Rect, chart: &ChartSnapshot) {
    let bids = depth_curve(&chart.bids);
    let asks = depth_curve(&chart.asks);

    let (lo, hi) = bids
        .iter()
        .chain(asks.iter())
        .map(|(price, _)| *price)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });
    let x = if lo.is_finite() && hi > lo {
        [lo, hi]
    } else {
        [0.0, 1.0]
    };
    let top = bids
        .last()
        .map(|(_, q)| *q)
        .into_iter()
        .chain(asks.last().map(|(_, q)| *q))
        .fold(0.0_f64, f64::max);
    let y = [0.0, if top > 0.0 { top * 1.05 } else { 1.0 }];

    let datasets = vec![
        Dataset::default()
            .name("bids")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&bids),
        Dataset::default()
            .name("asks")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&asks),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("Order Book Depth"))
        .x_axis(Axis::default().bounds(x).labels(axis_labels(x, 2)))
        .y_axis(Axis::default().bounds(y).labels(axis_labels(y, 2)));
    f.render_widget(widget, area);
}

fn ui(f: &mut ratatui::Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Percentage(35),
                Constraint::Percentage(20),
                Constraint::Percentage(20),
                Constraint::Min(8),
            ]
            .as_ref(),
        )
        .split(f.size());

    let price_text = match app.current_price() {
        Some(p) => format!("{:.2}", p),
        None => "Waiting for data...".to_string(),
    };
    let balance_text = match &app.balances {
        Some(b) => format!("base {:.2} | quote {}", b.base, b.quote.round_dp(6)),
        None => "-".to_string(),
    };
    let latest = app.chart.frames.last();
    let trend_text = latest
        .and_then(|f| f.trend)
        .map(|t| t.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Paper Trader [{}]", app.symbol),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Price: "),
        Span::styled(
            price_text,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " | Vol {} | {} | ADX {} | trend {}",
            fmt_opt(app.chart.volumes.last().copied().flatten(), 2),
            balance_text,
            fmt_opt(latest.and_then(|f| f.adx), 1),
            trend_text
        )),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(header, rows[0]);

    let halves = |area: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
            .split(area)
    };
    let oscillators = halves(rows[2]);
    let trend_row = halves(rows[3]);

    render_price_chart(f, rows[1], &app.chart);
    render_rsi_chart(f, oscillators[0], &app.chart);
    render_macd_chart(f, oscillators[1], &app.chart);
    render_stochastic_chart(f, trend_row[0], &app.chart);
    render_cci_adx_chart(f, trend_row[1], &app.chart);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ]
            .as_ref(),
        )
        .split(rows[4]);
    render_depth_chart(f, bottom[0], &app.chart);

    let trades: Vec<ListItem> = app
        .trades
        .iter()
        .rev()
        .map(|s| {
            let color = if s.contains(&EventKind::Buy.to_string()) {
                Color::Green
            } else {
                Color::Red
            };
            ListItem::new(Line::from(Span::styled(s, Style::default().fg(color))))
        })
        .collect();
    let trades_list =
        List::new(trades).block(Block::default().borders(Borders::ALL).title("Trades"));
    f.render_widget(trades_list, bottom[1]);

    let logs: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .map(|s| ListItem::new(Line::from(Span::raw(s))))
        .collect();
    let logs_list =
        List::new(logs).block(Block::default().borders(Borders::ALL).title("System Logs"));
    f.render_widget(logs_list, bottom[2]);
}
