// src/strategies/trend_pressure.rs
use crate::config::StrategyConfig;
use crate::connectors::traits::Ledger;
use crate::core::history::History;
use crate::indicators::{self, MacdParams, Reading};
use crate::strategies::traits::{Strategy, TickOutcome};
use crate::types::{
    Balances, ChartSnapshot, EventKind, IndicatorFrame, MarketSnapshot, Sample, Side, TradeEvent,
    Trend,
};
use crate::utils::format::fmt_opt;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Intent {
    Exit,
    Buy { delayed: bool },
    Sell { delayed: bool },
}

/// Trend-following strategy gated by order book pressure.
///
/// Enters long in an uptrend when MACD is above its signal line and bids
/// outweigh asks, sells on overbought RSI with bearish MACD and ask pressure,
/// and liquidates when the market goes flat and sideways. Trades are always
/// for the whole available balance.
pub struct TrendPressure {
    config: StrategyConfig,
    history: History,
    pending_buy: bool,
    pending_sell: bool,
    last_trade_price: Option<f64>,
}

impl TrendPressure {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            history: History::new(config.history_capacity),
            config,
            pending_buy: false,
            pending_sell: false,
            last_trade_price: None,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_trade_price(&self) -> Option<f64> {
        self.last_trade_price
    }

    #[cfg(test)]
    /// `(pending_buy, pending_sell)`
    pub fn pending(&self) -> (bool, bool) {
        (self.pending_buy, self.pending_sell)
    }

    fn compute_frame(&mut self, snapshot: &MarketSnapshot) -> IndicatorFrame {
        let cfg = &self.config;
        let history = &mut self.history;

        let macd = history.macd(MacdParams {
            fast: cfg.macd_fast,
            slow: cfg.macd_slow,
            signal: cfg.macd_signal,
        });

        let closes = history.closes();
        let highs = history.highs();
        let lows = history.lows();

        let rsi = indicators::rsi(closes, cfg.rsi_period);
        let atr = indicators::atr(highs, lows, closes, cfg.atr_period);
        let adx = indicators::adx(highs, lows, closes, cfg.adx_period);
        let bands = indicators::bollinger(closes, cfg.bollinger_period, cfg.bollinger_std_dev);
        let cci = indicators::cci(highs, lows, closes, cfg.cci_period);
        let stoch = indicators::stochastic(
            highs,
            lows,
            closes,
            cfg.stoch_k_period,
            cfg.stoch_d_period,
        );
        let trend = indicators::trend_direction(closes, cfg.trend_fast, cfg.trend_slow);
        let flat_market = indicators::is_flat_market(closes, cfg.flat_window, cfg.flat_threshold);
        let pressure =
            indicators::order_book_pressure(&snapshot.bids, &snapshot.asks, cfg.book_depth);

        if let Err(e) = &trend {
            debug!("Trend unknown: {}", e);
        }
        if let Ok(Reading::Degenerate(_)) = cci {
            debug!("CCI undefined (zero mean deviation), reporting 0");
        }
        if pressure.is_degenerate() {
            warn!("Empty or zero-volume order book, pressure defaults to 0");
        }

        IndicatorFrame {
            rsi: rsi.ok(),
            macd: macd.as_ref().ok().map(|m| m.macd),
            signal: macd.as_ref().ok().map(|m| m.signal),
            atr: atr.ok(),
            adx: adx.ok(),
            cci: cci.ok().map(|r| r.value()),
            stoch_k: stoch.as_ref().ok().map(|s| s.k),
            stoch_d: stoch.as_ref().ok().and_then(|s| s.d),
            boll_mid: bands.as_ref().ok().map(|b| b.mid),
            boll_upper: bands.as_ref().ok().map(|b| b.upper),
            boll_lower: bands.as_ref().ok().map(|b| b.lower),
            pressure: Some(pressure.value()),
            trend: trend.ok(),
            flat_market,
        }
    }

    /// Picks at most one action for this tick: exit, then buy, then sell.
    /// Arms the pending latches when delayed confirmation is enabled.
    fn decide(&mut self, frame: &IndicatorFrame, balances: Balances) -> Option<Intent> {
        let cfg = &self.config;
        let trend = frame.trend?;
        let pressure = frame.pressure.unwrap_or(0.0);
        let holding = balances.quote > Decimal::ZERO;

        if holding && frame.flat_market && trend == Trend::Sideways {
            info!("Flat market with sideways trend, exiting full position");
            return Some(Intent::Exit);
        }

        if balances.base > Decimal::ZERO {
            match (trend, frame.macd, frame.signal) {
                (Trend::Uptrend, Some(macd), Some(signal)) => {
                    if macd > signal && pressure > cfg.buy_pressure {
                        info!("Strong BUY signal");
                        return Some(Intent::Buy { delayed: false });
                    }
                    if cfg.delayed_confirmation {
                        if self.pending_buy && macd > signal && pressure > cfg.delayed_pressure {
                            info!("Delayed BUY confirmed");
                            return Some(Intent::Buy { delayed: true });
                        }
                        if frame.rsi.is_some_and(|rsi| rsi < cfg.rsi_oversold) {
                            debug!("Oversold RSI, arming pending buy");
                            self.pending_buy = true;
                        }
                    }
                }
                (Trend::Downtrend, _, _) => debug!("Avoid buying, downtrend"),
                _ => {}
            }
        }

        if holding {
            if trend == Trend::Uptrend {
                debug!("Avoid selling, uptrend");
            } else if let (Some(rsi), Some(macd), Some(signal)) = (frame.rsi, frame.macd, frame.signal) {
                if rsi > cfg.rsi_overbought && macd < signal && pressure < cfg.sell_pressure {
                    info!("Strong SELL signal");
                    return Some(Intent::Sell { delayed: false });
                }
                if cfg.delayed_confirmation {
                    if self.pending_sell && macd < signal && pressure < -cfg.delayed_pressure {
                        info!("Delayed SELL confirmed");
                        return Some(Intent::Sell { delayed: true });
                    }
                    if rsi > cfg.rsi_overbought {
                        debug!("Overbought RSI, arming pending sell");
                        self.pending_sell = true;
                    }
                }
            }
        }

        None
    }

    fn is_stagnant(&self, price: f64) -> bool {
        match self.last_trade_price {
            Some(last) if last != 0.0 => {
                ((price - last) / last).abs() < self.config.stagnation_threshold
            }
            _ => false,
        }
    }

    fn execute(
        &mut self,
        intent: Intent,
        snapshot: &MarketSnapshot,
        price: f64,
        frame: &IndicatorFrame,
        ledger: &mut dyn Ledger,
    ) -> TickOutcome {
        if self.is_stagnant(price) {
            info!(
                "Skipping {:?} due to price stagnation (last trade {})",
                intent,
                fmt_opt(self.last_trade_price, 2)
            );
            return TickOutcome::Stagnant;
        }

        let (kind, delayed, fill) = match intent {
            Intent::Exit => (
                EventKind::MarketExit,
                false,
                ledger.sell(snapshot.price, Decimal::ONE),
            ),
            Intent::Buy { delayed } => (
                EventKind::Buy,
                delayed,
                ledger.buy(snapshot.price, Decimal::ONE),
            ),
            Intent::Sell { delayed } => (
                EventKind::Sell,
                delayed,
                ledger.sell(snapshot.price, Decimal::ONE),
            ),
        };

        let Some(fill) = fill else {
            warn!("Ledger rejected {} at {}", kind, snapshot.price);
            return TickOutcome::Hold;
        };

        self.last_trade_price = Some(price);
        match kind.side() {
            Side::Buy => self.pending_buy = false,
            Side::Sell => self.pending_sell = false,
        }
        self.history
            .record_trade(kind.side(), snapshot.timestamp, price);

        let mut context = format!(
            "RSI={} MACD={} ADX={} TREND={}",
            fmt_opt(frame.rsi, 1),
            fmt_opt(frame.macd, 2),
            fmt_opt(frame.adx, 1),
            frame.trend.map_or("unknown".to_string(), |t| t.to_string()),
        );
        if delayed {
            context.push_str(" CONFIRMATION=delayed");
        }

        TickOutcome::Traded(TradeEvent {
            id: Uuid::new_v4(),
            timestamp: snapshot.timestamp,
            kind,
            price: snapshot.price,
            context,
            fill,
        })
    }

    fn evaluate(&mut self, snapshot: &MarketSnapshot, ledger: &mut dyn Ledger) -> TickOutcome {
        let sample = Sample::from(snapshot);
        self.history.push(sample);
        self.history
            .set_book(&snapshot.bids, &snapshot.asks, self.config.book_depth);

        let collected = self.history.len();
        let required = self.config.warmup_samples;
        if collected < required {
            info!("P:{:.2} warming up {}/{}", sample.price, collected, required);
            return TickOutcome::WarmingUp {
                collected,
                required,
            };
        }

        let frame = self.compute_frame(snapshot);
        self.history.set_latest_frame(frame);

        info!(
            "P:{:.2} RSI:{} MACD:{}/{} ATR:{} ADX:{} CCI:{} %K/D:{}/{} BB:{}/{}/{} pressure:{} trend:{} flat:{}",
            sample.price,
            fmt_opt(frame.rsi, 1),
            fmt_opt(frame.macd, 4),
            fmt_opt(frame.signal, 4),
            fmt_opt(frame.atr, 3),
            fmt_opt(frame.adx, 1),
            fmt_opt(frame.cci, 1),
            fmt_opt(frame.stoch_k, 1),
            fmt_opt(frame.stoch_d, 1),
            fmt_opt(frame.boll_lower, 2),
            fmt_opt(frame.boll_mid, 2),
            fmt_opt(frame.boll_upper, 2),
            fmt_opt(frame.pressure, 3),
            frame.trend.map_or("unknown".to_string(), |t| t.to_string()),
            frame.flat_market,
        );

        match self.decide(&frame, ledger.position()) {
            Some(intent) => self.execute(intent, snapshot, sample.price, &frame, ledger),
            None => TickOutcome::Hold,
        }
    }
}

impl Strategy for TrendPressure {
    fn name(&self) -> &str {
        "trend_pressure"
    }

    fn on_tick(&mut self, snapshot: &MarketSnapshot, ledger: &mut dyn Ledger) -> TickOutcome {
        let outcome = self.evaluate(snapshot, ledger);
        self.history.enforce_capacity();
        outcome
    }

    fn chart(&self) -> ChartSnapshot {
        self.history.snapshot()
    }
}
