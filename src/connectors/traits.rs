use crate::types::{Balances, Fill, MarketSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("symbol {0} not found in ticker response")]
    SymbolNotFound(String),

    #[error("malformed market data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches the current snapshot. Any error means "no data" for this tick;
    /// implementations never return a stale snapshot.
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot, FetchError>;
}

/// Holds the base currency and quoted asset balances.
///
/// Both mutators trade a fraction in `[0, 1]` of the relevant balance and
/// return `None` without touching anything when the traded amount would not be
/// positive.
pub trait Ledger: Send {
    fn buy(&mut self, price: Decimal, fraction_of_base: Decimal) -> Option<Fill>;

    fn sell(&mut self, price: Decimal, fraction_of_quote: Decimal) -> Option<Fill>;

    fn position(&self) -> Balances;
}
