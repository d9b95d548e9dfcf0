// src/connectors/paper.rs
use crate::connectors::traits::Ledger;
use crate::types::{Balances, Fill, Side};
use crate::utils::precision::normalize_quantity;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// In-memory ledger for paper trading. Balances never go negative.
#[derive(Debug, Clone)]
pub struct PaperWallet {
    base: Decimal,
    quote: Decimal,
    quantity_step: Decimal,
}

impl PaperWallet {
    pub fn new(initial_base: Decimal) -> Self {
        Self {
            base: initial_base.max(Decimal::ZERO),
            quote: Decimal::ZERO,
            quantity_step: Decimal::ZERO,
        }
    }

    pub fn with_quantity_step(mut self, step: Decimal) -> Self {
        self.quantity_step = step.max(Decimal::ZERO);
        self
    }

    #[cfg(test)]
    pub fn with_quote(mut self, quote: Decimal) -> Self {
        self.quote = quote.max(Decimal::ZERO);
        self
    }
}

fn clamp_fraction(fraction: Decimal) -> Decimal {
    fraction.max(Decimal::ZERO).min(Decimal::ONE)
}

impl Ledger for PaperWallet {
    fn buy(&mut self, price: Decimal, fraction_of_base: Decimal) -> Option<Fill> {
        if price <= Decimal::ZERO {
            debug!("Paper buy ignored: non-positive price {}", price);
            return None;
        }

        let budget = self.base * clamp_fraction(fraction_of_base);
        let quantity = normalize_quantity(budget / price, self.quantity_step);
        // Spending the whole balance must not leave rounding dust behind.
        let notional = if self.quantity_step.is_zero() {
            budget
        } else {
            (quantity * price).min(self.base)
        };

        if quantity <= Decimal::ZERO || notional <= Decimal::ZERO {
            debug!("Paper buy ignored: nothing to spend");
            return None;
        }

        self.base -= notional;
        self.quote += quantity;
        info!("[BUY] Bought {} at {} (spent {})", quantity, price, notional);

        Some(Fill {
            side: Side::Buy,
            price,
            quantity,
            notional,
        })
    }

    fn sell(&mut self, price: Decimal, fraction_of_quote: Decimal) -> Option<Fill> {
        if price <= Decimal::ZERO {
            debug!("Paper sell ignored: non-positive price {}", price);
            return None;
        }

        let requested = self.quote * clamp_fraction(fraction_of_quote);
        let quantity = if fraction_of_quote >= Decimal::ONE {
            self.quote
        } else {
            normalize_quantity(requested, self.quantity_step)
        };

        if quantity <= Decimal::ZERO {
            debug!("Paper sell ignored: nothing to sell");
            return None;
        }

        let notional = quantity * price;
        self.quote -= quantity;
        self.base += notional;
        info!("[SELL] Sold {} at {} (received {})", quantity, price, notional);

        Some(Fill {
            side: Side::Sell,
            price,
            quantity,
            notional,
        })
    }

    fn position(&self) -> Balances {
        Balances {
            base: self.base,
            quote: self.quote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn full_buy_moves_all_base() {
        let mut wallet = PaperWallet::new(dec!(2500));
        let fill = wallet.buy(dec!(125), Decimal::ONE).unwrap();
        assert_eq!(fill.quantity, dec!(20));
        assert_eq!(wallet.position(), Balances { base: dec!(0), quote: dec!(20) });
    }

    #[test]
    fn full_sell_liquidates() {
        let mut wallet = PaperWallet::new(dec!(0)).with_quote(dec!(2));
        let fill = wallet.sell(dec!(150), Decimal::ONE).unwrap();
        assert_eq!(fill.notional, dec!(300));
        assert_eq!(wallet.position(), Balances { base: dec!(300), quote: dec!(0) });
    }

    #[test]
    fn empty_balances_are_noops() {
        let mut wallet = PaperWallet::new(dec!(0));
        assert!(wallet.buy(dec!(100), Decimal::ONE).is_none());
        assert!(wallet.sell(dec!(100), Decimal::ONE).is_none());
        assert_eq!(wallet.position(), Balances::default());
    }

    #[test]
    fn invalid_requests_are_ignored() {
        let mut wallet = PaperWallet::new(dec!(100));
        assert!(wallet.buy(dec!(0), Decimal::ONE).is_none());
        assert!(wallet.buy(dec!(10), dec!(0)).is_none());
        assert!(wallet.buy(dec!(10), dec!(-0.5)).is_none());
        assert_eq!(wallet.position().base, dec!(100));
    }

    #[test]
    fn fraction_is_clamped() {
        let mut wallet = PaperWallet::new(dec!(100));
        let fill = wallet.buy(dec!(10), dec!(3)).unwrap();
        assert_eq!(fill.notional, dec!(100));
        assert_eq!(wallet.position().base, dec!(0));
    }

    #[test]
    fn quantity_step_rounds_down() {
        let mut wallet = PaperWallet::new(dec!(100)).with_quantity_step(dec!(0.1));
        let fill = wallet.buy(dec!(30), Decimal::ONE).unwrap();
        assert_eq!(fill.quantity, dec!(3.3));
        assert_eq!(fill.notional, dec!(99.0));
        assert_eq!(wallet.position().base, dec!(1.0));
    }
}
