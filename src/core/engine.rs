// src/core/engine.rs
use crate::connectors::traits::{Ledger, MarketDataSource};
use crate::storage::journal::TradeJournal;
use crate::strategies::traits::{Strategy, TickOutcome};
use crate::types::{Balances, UiEvent};
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Poll-driven control loop: fetch a snapshot, hand it to the strategy, record
/// the outcome, wait for the next interval. Ticks never overlap.
pub struct TradingEngine<S> {
    source: Box<dyn MarketDataSource>,
    ledger: Box<dyn Ledger>,
    strategy: S,
    journal: Option<TradeJournal>,
    ui_sender: Option<mpsc::Sender<UiEvent>>,
    poll_interval: Duration,
}

impl<S> TradingEngine<S>
where
    S: Strategy,
{
    pub fn new(
        source: Box<dyn MarketDataSource>,
        ledger: Box<dyn Ledger>,
        strategy: S,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            ledger,
            strategy,
            journal: None,
            ui_sender: None,
            poll_interval,
        }
    }

    pub fn with_journal(mut self, journal: TradeJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_ui(mut self, ui_sender: mpsc::Sender<UiEvent>) -> Self {
        self.ui_sender = Some(ui_sender);
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn balances(&self) -> Balances {
        self.ledger.position()
    }

    fn send_ui_event(&self, event: UiEvent) {
        let Some(sender) = &self.ui_sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("UI Channel closed! Interface is likely dead.");
            }
        }
    }

    /// Runs until `shutdown` resolves. A tick in progress always completes.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Engine starting: strategy {}, polling every {:?}",
            self.strategy.name(),
            self.poll_interval
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, engine stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        let balances = self.ledger.position();
        info!(
            "Final balances: base {} quote {}",
            balances.base, balances.quote
        );
        Ok(())
    }

    /// Processes one poll. Returns `None` when the source had no data, in which
    /// case nothing was recorded.
    pub async fn tick(&mut self) -> Option<TickOutcome> {
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("No market data this tick: {}", e);
                self.send_ui_event(UiEvent::Log(format!("No data: {e}")));
                return None;
            }
        };

        let outcome = self.strategy.on_tick(&snapshot, self.ledger.as_mut());

        if let TickOutcome::WarmingUp {
            collected,
            required,
        } = &outcome
        {
            self.send_ui_event(UiEvent::Log(format!(
                "Warming up {collected}/{required}"
            )));
        }

        if let TickOutcome::Traded(event) = &outcome {
            info!(
                "{} executed: {} @ {} | {}",
                event.kind, event.fill.quantity, event.price, event.context
            );
            if let Some(journal) = &self.journal {
                if let Err(e) = journal.append(event).await {
                    error!("Failed to write trade journal: {:#}", e);
                }
            }
            self.send_ui_event(UiEvent::Trade(event.clone()));
            self.send_ui_event(UiEvent::Log(format!(
                "{} @ {} | {}",
                event.kind, event.price, event.context
            )));
        }

        let balances = self.ledger.position();
        info!("Balance: base {} quote {}", balances.base, balances.quote);

        if self.ui_sender.is_some() {
            self.send_ui_event(UiEvent::Balances(balances));
            self.send_ui_event(UiEvent::Chart(Box::new(self.strategy.chart())));
        }

        Some(outcome)
    }
}
