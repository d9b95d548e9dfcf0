// src/main.rs
use crate::config::AppConfig;
use crate::connectors::coindcx::CoinDcxClient;
use crate::connectors::paper::PaperWallet;
use crate::core::engine::TradingEngine;
use crate::storage::journal::TradeJournal;
use crate::strategies::trend_pressure::TrendPressure;
use crate::utils::format::fmt_opt;
use anyhow::Context;
use dotenvy::dotenv;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod connectors;
mod core;
mod indicators;
mod storage;
mod strategies;
#[cfg(test)]
mod testing;
mod tui;
mod types;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new().context("Invalid configuration")?;

    // 2. Logging: always to a daily file, to stdout only when the TUI is off
    let file_appender =
        tracing_appender::rolling::daily(&config.logging.directory, &config.logging.file_prefix);
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    let stdout_layer = (!config.ui.enabled).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(stdout_layer)
        .init();

    let symbol = config.market.symbol.clone();
    let journal = TradeJournal::new(&config.journal.path);

    println!("========================================");
    println!("       PAPER TRADER - v0.1.0");
    println!("========================================");
    println!("Target:  {}", symbol);
    println!("Wallet:  {} base", config.wallet.initial_base);
    println!("Polling: every {}s", config.market.poll_interval_secs);
    println!("Journal: {}", journal.path().display());
    println!("========================================");

    // 3. Initialize Components
    let source = CoinDcxClient::new(&config.market)?;
    let wallet = PaperWallet::new(config.wallet.initial_base)
        .with_quantity_step(config.wallet.quantity_step);
    let strategy = TrendPressure::new(config.strategy.clone());

    let mut engine = TradingEngine::new(
        Box::new(source),
        Box::new(wallet),
        strategy,
        Duration::from_secs(config.market.poll_interval_secs),
    )
    .with_journal(journal);

    // 4. Run Engine, with the dashboard on a blocking thread if enabled
    if config.ui.enabled {
        let (ui_tx, ui_rx) = mpsc::channel(100);
        engine = engine.with_ui(ui_tx);
        let mut ui_task = tokio::task::spawn_blocking(move || tui::run(ui_rx, symbol));

        tokio::select! {
            result = engine.run(shutdown_signal()) => {
                if let Err(e) = result {
                    error!("Fatal Engine Error: {:#}", e);
                }
            }
            result = &mut ui_task => {
                match result {
                    Ok(Ok(())) => info!("Dashboard closed, shutting down"),
                    Ok(Err(e)) => error!("Dashboard failed: {:#}", e),
                    Err(e) => error!("Dashboard task panicked: {}", e),
                }
            }
        }
    } else if let Err(e) = engine.run(shutdown_signal()).await {
        error!("Fatal Engine Error: {:#}", e);
    }

    let balances = engine.balances();
    println!(
        "Final balances: base {} | quote {}",
        balances.base, balances.quote
    );
    println!(
        "Last trade price: {}",
        fmt_opt(engine.strategy().last_trade_price(), 2)
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
