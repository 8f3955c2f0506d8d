use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top of book for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
    /// Shares per unit: 100 for option contracts, 1 for equities.
    pub multiplier: i32,
}

impl Quote {
    #[must_use]
    pub const fn equity(price: Decimal) -> Self {
        Self {
            bid: price,
            ask: price,
            multiplier: 1,
        }
    }

    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }
}

/// A simulated market fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub quantity: i32,
    pub price: Decimal,
    pub commission: Decimal,
}

impl Fill {
    /// Signed cash impact, commission included.
    #[must_use]
    pub fn cash_flow(&self, multiplier: i32) -> Decimal {
        -(Decimal::from(self.quantity) * self.price * Decimal::from(multiplier)) - self.commission
    }
}

/// Fills market orders against the quoted book: buys lift the ask, sells hit the bid.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutionHandler {
    commission_per_unit: Decimal,
}

impl SimulatedExecutionHandler {
    /// `commission_per_unit` is charged per contract or share traded.
    #[must_use]
    pub const fn new(commission_per_unit: Decimal) -> Self {
        Self {
            commission_per_unit,
        }
    }

    #[must_use]
    pub fn fill_price(quote: &Quote, quantity: i32) -> Decimal {
        if quantity > 0 {
            quote.ask
        } else {
            quote.bid
        }
    }

    #[must_use]
    pub fn execute(
        &self,
        timestamp: NaiveDateTime,
        instrument: &str,
        quantity: i32,
        quote: &Quote,
    ) -> Fill {
        Fill {
            order_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            instrument: instrument.to_string(),
            quantity,
            price: Self::fill_price(quote, quantity),
            commission: self.commission_per_unit * Decimal::from(quantity.unsigned_abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote() -> Quote {
        Quote {
            bid: dec!(1.90),
            ask: dec!(2.00),
            multiplier: 100,
        }
    }

    #[test]
    fn buys_at_ask_sells_at_bid() {
        let handler = SimulatedExecutionHandler::default();
        let t = NaiveDateTime::default();
        assert_eq!(handler.execute(t, "SPY 100C", 5, &quote()).price, dec!(2.00));
        assert_eq!(handler.execute(t, "SPY 100C", -5, &quote()).price, dec!(1.90));
    }

    #[test]
    fn commission_scales_with_size_and_hits_cash() {
        let handler = SimulatedExecutionHandler::new(dec!(0.65));
        let fill = handler.execute(NaiveDateTime::default(), "SPY 100C", -10, &quote());
        assert_eq!(fill.commission, dec!(6.50));
        // sell 10 × 1.90 × 100 = +1900, less 6.50 commission
        assert_eq!(fill.cash_flow(100), dec!(1893.50));
    }

    #[test]
    fn order_ids_are_unique() {
        let handler = SimulatedExecutionHandler::default();
        let a = handler.execute(NaiveDateTime::default(), "SPY", 1, &Quote::equity(dec!(470)));
        let b = handler.execute(NaiveDateTime::default(), "SPY", 1, &Quote::equity(dec!(470)));
        assert_ne!(a.order_id, b.order_id);
    }

    #[test]
    fn mid_is_average() {
        assert_eq!(quote().mid(), dec!(1.95));
    }
}
