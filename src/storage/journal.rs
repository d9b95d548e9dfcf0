// src/storage/journal.rs
use crate::types::TradeEvent;
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Append-only text log with one line per executed trade:
/// `[2024-03-01T12:00:00Z] BUY @ 150.00 | RSI=... MACD=...`
pub struct TradeJournal {
    path: PathBuf,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(event: &TradeEvent) -> String {
        format!(
            "[{}] {} @ {:.2} | {}\n",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event.kind,
            event.price,
            event.context
        )
    }

    pub async fn append(&self, event: &TradeEvent) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open trade journal {}", self.path.display()))?;

        file.write_all(Self::format_line(event).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventKind, Fill, Side};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn event(kind: EventKind) -> TradeEvent {
        TradeEvent {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            kind,
            price: dec!(150.45),
            context: "RSI=55.0 TREND=uptrend".to_string(),
            fill: Fill {
                side: kind.side(),
                price: dec!(150.45),
                quantity: dec!(1),
                notional: dec!(150.45),
            },
        }
    }

    #[test]
    fn line_format() {
        assert_eq!(
            TradeJournal::format_line(&event(EventKind::MarketExit)),
            "[2024-03-01T12:00:00Z] MARKET_EXIT @ 150.45 | RSI=55.0 TREND=uptrend\n"
        );
        assert_eq!(event(EventKind::Buy).fill.side, Side::Buy);
    }

    #[tokio::test]
    async fn appends_one_line_per_event() {
        let path = std::env::temp_dir().join(format!("journal-{}.log", Uuid::new_v4()));
        let journal = TradeJournal::new(&path);

        journal.append(&event(EventKind::Buy)).await.unwrap();
        journal.append(&event(EventKind::Sell)).await.unwrap();

        let contents = tokio::fs::read_to_string(journal.path()).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("] BUY @ 150.45"));
        assert!(lines[1].contains("] SELL @ 150.45"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
