// src/connectors/coindcx.rs
use crate::config::MarketConfig;
use crate::connectors::messages::{find_ticker, CoinDcxOrderBook, CoinDcxTicker};
use crate::connectors::traits::{FetchError, MarketDataSource};
use crate::types::MarketSnapshot;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Polls the public CoinDCX REST endpoints. No credentials needed.
pub struct CoinDcxClient {
    http_client: Client,
    symbol: String,
    pair: String,
    ticker_url: String,
    orderbook_url: String,
}

impl CoinDcxClient {
    pub fn new(config: &MarketConfig) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            symbol: config.symbol.clone(),
            pair: config.pair.clone(),
            ticker_url: config.ticker_url.clone(),
            orderbook_url: config.orderbook_url.clone(),
        })
    }

    async fn fetch_ticker(&self) -> Result<CoinDcxTicker, FetchError> {
        let tickers = self
            .http_client
            .get(&self.ticker_url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CoinDcxTicker>>()
            .await?;

        find_ticker(tickers, &self.symbol)
    }

    async fn fetch_order_book(&self) -> Result<CoinDcxOrderBook, FetchError> {
        let book = self
            .http_client
            .get(&self.orderbook_url)
            .query(&[("pair", self.pair.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<CoinDcxOrderBook>()
            .await?;

        Ok(book)
    }
}

#[async_trait]
impl MarketDataSource for CoinDcxClient {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot, FetchError> {
        let (ticker, book) = tokio::join!(self.fetch_ticker(), self.fetch_order_book());

        // A missing book only disables the pressure-gated rules.
        let (bids, asks) = match book {
            Ok(book) => book.into_levels(),
            Err(e) => {
                warn!("Order book unavailable for {}: {}", self.pair, e);
                (Vec::new(), Vec::new())
            }
        };

        let snapshot = ticker?.into_snapshot(bids, asks, Utc::now())?;
        debug!(
            "Fetched {} @ {} ({} bids / {} asks)",
            snapshot.symbol,
            snapshot.price,
            snapshot.bids.len(),
            snapshot.asks.len()
        );
        Ok(snapshot)
    }
}
