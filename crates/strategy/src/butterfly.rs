//! Butterfly-shaped spreads centred on the ATM strike.

use tracing::debug;
use volspread_core::config::{ButterflyTiers, IronButterflyTiers};
use volspread_core::{AccountFunds, EngineResult, StrategyKind, TradedChain};

use crate::builder::{OptionStrategy, Sizing};
use crate::order::{LegOrder, StrategyOrder};
use crate::selection::{atm_pair, itm_ladder, otm_ladder, pick_tier};

/// Long call butterfly: buy one OTM and one ITM call, sell two ATM calls.
#[derive(Debug, Clone, Copy)]
pub struct Butterfly {
    tiers: ButterflyTiers,
}

impl Butterfly {
    #[must_use]
    pub const fn new(tiers: ButterflyTiers) -> Self {
        Self { tiers }
    }
}

impl OptionStrategy for Butterfly {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Butterfly
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let kind = self.kind();
        let (atm, _) = atm_pair(chain)?;
        let otm = pick_tier(&otm_ladder(&chain.calls), self.tiers.otm, kind, "OTM call")?;
        let itm = pick_tier(&itm_ladder(&chain.calls), self.tiers.itm, kind, "ITM call")?;

        let premium = otm.ask + itm.ask + atm.bid * rust_decimal::Decimal::from(2);
        let units = Sizing::require_nonzero(sizing.margin_units(funds, premium), kind)?;

        debug!(
            underlying = %chain.underlying,
            otm_strike = %otm.strike,
            itm_strike = %itm.strike,
            atm_strike = %atm.strike,
            spot = %atm.underlying_price,
            units,
            "Butterfly legs selected"
        );

        Ok(StrategyOrder::new(
            kind,
            chain.underlying.clone(),
            chain.expiry,
            vec![
                LegOrder {
                    contract: otm.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: itm.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: atm.clone(),
                    quantity: -2 * units,
                },
            ],
        ))
    }
}

/// Iron butterfly: sell the ATM call and put, buy OTM call and put wings.
#[derive(Debug, Clone, Copy)]
pub struct IronButterfly {
    tiers: IronButterflyTiers,
}

impl IronButterfly {
    #[must_use]
    pub const fn new(tiers: IronButterflyTiers) -> Self {
        Self { tiers }
    }
}

impl OptionStrategy for IronButterfly {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IronButterfly
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let kind = self.kind();
        let (atm_call, atm_put) = atm_pair(chain)?;
        let call_wing = pick_tier(&otm_ladder(&chain.calls), self.tiers.wing, kind, "OTM call")?;
        let put_wing = pick_tier(&otm_ladder(&chain.puts), self.tiers.wing, kind, "OTM put")?;

        let premium = call_wing.ask + put_wing.ask + atm_call.bid + atm_put.bid;
        let units = Sizing::require_nonzero(sizing.margin_units(funds, premium), kind)?;

        debug!(
            underlying = %chain.underlying,
            atm_strike = %atm_call.strike,
            call_wing = %call_wing.strike,
            put_wing = %put_wing.strike,
            units,
            "Iron butterfly legs selected"
        );

        Ok(StrategyOrder::new(
            kind,
            chain.underlying.clone(),
            chain.expiry,
            vec![
                LegOrder {
                    contract: atm_call.clone(),
                    quantity: -units,
                },
                LegOrder {
                    contract: atm_put.clone(),
                    quantity: -units,
                },
                LegOrder {
                    contract: call_wing.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: put_wing.clone(),
                    quantity: units,
                },
            ],
        ))
    }
}
