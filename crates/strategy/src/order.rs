use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use volspread_core::{unit_close_cost, Leg, OptionContract, StrategyKind, CONTRACT_MULTIPLIER};

/// One contract and the signed quantity to trade in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegOrder {
    pub contract: OptionContract,
    pub quantity: i32,
}

/// The full set of legs for one strategy entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOrder {
    pub strategy: StrategyKind,
    pub underlying: String,
    pub expiry: NaiveDate,
    pub legs: Vec<LegOrder>,
}

impl StrategyOrder {
    /// Builds an order, netting legs that landed on the same contract and
    /// dropping any that net to zero.
    #[must_use]
    pub fn new(
        strategy: StrategyKind,
        underlying: impl Into<String>,
        expiry: NaiveDate,
        legs: Vec<LegOrder>,
    ) -> Self {
        let mut netted: Vec<LegOrder> = Vec::with_capacity(legs.len());
        for leg in legs {
            match netted.iter_mut().find(|l| l.contract.symbol == leg.contract.symbol) {
                Some(existing) => existing.quantity += leg.quantity,
                None => netted.push(leg),
            }
        }
        netted.retain(|l| l.quantity != 0);

        Self {
            strategy,
            underlying: underlying.into(),
            expiry,
            legs: netted,
        }
    }

    /// Per-unit cost to close the order at the quoted prices, the mark the
    /// stop-loss is measured against. See [`unit_close_cost`].
    ///
    /// For a short straddle this is `ask(call) + ask(put)`.
    #[must_use]
    pub fn close_cost(&self) -> Decimal {
        let legs: Vec<(i32, Decimal)> = self
            .legs
            .iter()
            .map(|l| {
                let price = if l.quantity < 0 { l.contract.ask } else { l.contract.bid };
                (l.quantity, price)
            })
            .collect();
        unit_close_cost(&legs)
    }

    /// Net share-equivalent delta of the order, if every leg carries a delta.
    #[must_use]
    pub fn net_delta(&self) -> Option<f64> {
        self.legs.iter().try_fold(0.0, |acc, leg| {
            leg.contract
                .delta
                .map(|d| acc + d * f64::from(leg.quantity) * f64::from(CONTRACT_MULTIPLIER))
        })
    }

    /// The legs as the position tracker records them.
    #[must_use]
    pub fn held_legs(&self) -> Vec<Leg> {
        self.legs
            .iter()
            .map(|l| Leg {
                symbol: l.contract.symbol.clone(),
                quantity: l.quantity,
            })
            .collect()
    }
}
