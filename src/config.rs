// src/config.rs

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketConfig {
    /// Ticker market name, e.g. `ETHUSDT`.
    pub symbol: String,
    /// Order-book pair name, e.g. `I-ETH_USDT`.
    pub pair: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub ticker_url: String,
    pub orderbook_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: "ETHUSDT".to_string(),
            pair: "I-ETH_USDT".to_string(),
            poll_interval_secs: 3,
            request_timeout_secs: 10,
            ticker_url: "https://api.coindcx.com/exchange/ticker".to_string(),
            orderbook_url: "https://public.coindcx.com/market_data/orderbook".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WalletConfig {
    pub initial_base: Decimal,
    /// Traded quantities are rounded down to this step; zero disables rounding.
    pub quantity_step: Decimal,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            initial_base: dec!(2500),
            quantity_step: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    pub warmup_samples: usize,
    pub history_capacity: usize,

    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub adx_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub cci_period: usize,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub trend_fast: usize,
    pub trend_slow: usize,
    pub flat_window: usize,
    pub flat_threshold: f64,
    pub book_depth: usize,

    pub buy_pressure: f64,
    pub sell_pressure: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Minimum relative move since the last trade before trading again.
    pub stagnation_threshold: f64,

    /// Enables the pending-signal confirmation path.
    pub delayed_confirmation: bool,
    pub delayed_pressure: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            warmup_samples: 50,
            history_capacity: 300,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
            adx_period: 7,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            cci_period: 20,
            stoch_k_period: 14,
            stoch_d_period: 3,
            trend_fast: 10,
            trend_slow: 50,
            flat_window: 20,
            flat_threshold: 0.001,
            book_depth: 5,
            buy_pressure: 0.1,
            sell_pressure: -0.1,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            stagnation_threshold: 0.002,
            delayed_confirmation: false,
            delayed_pressure: 0.05,
        }
    }
}

impl StrategyConfig {
    /// Longest look-back any indicator needs on the close series.
    pub fn longest_window(&self) -> usize {
        [
            self.rsi_period,
            self.macd_slow,
            self.atr_period + 1,
            self.adx_period * 2,
            self.bollinger_period,
            self.cci_period,
            self.stoch_k_period,
            self.trend_slow,
            self.flat_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_period", self.atr_period),
            ("adx_period", self.adx_period),
            ("bollinger_period", self.bollinger_period),
            ("cci_period", self.cci_period),
            ("stoch_k_period", self.stoch_k_period),
            ("stoch_d_period", self.stoch_d_period),
            ("trend_fast", self.trend_fast),
            ("trend_slow", self.trend_slow),
            ("flat_window", self.flat_window),
            ("book_depth", self.book_depth),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Message(format!("strategy.{name} must be > 0")));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::Message(
                "strategy.macd_fast must be less than strategy.macd_slow".to_string(),
            ));
        }
        if self.trend_fast >= self.trend_slow {
            return Err(ConfigError::Message(
                "strategy.trend_fast must be less than strategy.trend_slow".to_string(),
            ));
        }
        if self.warmup_samples < self.longest_window() {
            return Err(ConfigError::Message(format!(
                "strategy.warmup_samples ({}) is shorter than the longest indicator window ({})",
                self.warmup_samples,
                self.longest_window()
            )));
        }
        if self.history_capacity < self.warmup_samples {
            return Err(ConfigError::Message(
                "strategy.history_capacity must be at least strategy.warmup_samples".to_string(),
            ));
        }
        if self.stagnation_threshold < 0.0 || self.flat_threshold < 0.0 {
            return Err(ConfigError::Message(
                "strategy thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub enabled: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct JournalConfig {
    pub path: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: "trade_events.log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "paper_trader.log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub wallet: WalletConfig,
    pub strategy: StrategyConfig,
    pub ui: UiConfig,
    pub journal: JournalConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("Settings").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "market.poll_interval_secs must be > 0".to_string(),
            ));
        }
        if self.wallet.initial_base < Decimal::ZERO {
            return Err(ConfigError::Message(
                "wallet.initial_base must not be negative".to_string(),
            ));
        }
        self.strategy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy.warmup_samples, 50);
        assert_eq!(config.strategy.history_capacity, 300);
        assert!(!config.strategy.delayed_confirmation);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let raw = r#"
            [market]
            symbol = "BTCUSDT"
            poll_interval_secs = 5

            [strategy]
            delayed_confirmation = true
        "#;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.market.symbol, "BTCUSDT");
        assert_eq!(config.market.pair, "I-ETH_USDT");
        assert_eq!(config.market.poll_interval_secs, 5);
        assert!(config.strategy.delayed_confirmation);
        assert_eq!(config.strategy.rsi_period, 14);
        assert_eq!(config.wallet.initial_base, dec!(2500));
    }

    #[test]
    fn rejects_short_warmup() {
        let mut config = AppConfig::default();
        config.strategy.warmup_samples = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_macd() {
        let mut config = AppConfig::default();
        config.strategy.macd_fast = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.market.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
