use tracing::debug;
use volspread_core::config::{CondorTiers, IronCondorTiers};
use volspread_core::{AccountFunds, EngineResult, StrategyKind, TradedChain};

use crate::builder::{OptionStrategy, Sizing};
use crate::order::{LegOrder, StrategyOrder};
use crate::selection::{itm_ladder, otm_ladder, pick_tier};

/// Call condor: long the outer OTM and ITM calls, short the inner ones.
#[derive(Debug, Clone, Copy)]
pub struct Condor {
    tiers: CondorTiers,
}

impl Condor {
    #[must_use]
    pub const fn new(tiers: CondorTiers) -> Self {
        Self { tiers }
    }
}

impl OptionStrategy for Condor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Condor
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let kind = self.kind();
        let otm = otm_ladder(&chain.calls);
        let itm = itm_ladder(&chain.calls);
        let otm_buy = pick_tier(&otm, self.tiers.otm_buy, kind, "OTM call")?;
        let otm_sell = pick_tier(&otm, self.tiers.otm_sell, kind, "OTM call")?;
        let itm_buy = pick_tier(&itm, self.tiers.itm_buy, kind, "ITM call")?;
        let itm_sell = pick_tier(&itm, self.tiers.itm_sell, kind, "ITM call")?;

        let premium = otm_buy.ask + itm_buy.ask + otm_sell.bid + itm_sell.bid;
        let units = Sizing::require_nonzero(sizing.margin_units(funds, premium), kind)?;

        debug!(
            underlying = %chain.underlying,
            otm_buy = %otm_buy.strike,
            otm_sell = %otm_sell.strike,
            itm_buy = %itm_buy.strike,
            itm_sell = %itm_sell.strike,
            units,
            "Condor legs selected"
        );

        Ok(StrategyOrder::new(
            kind,
            chain.underlying.clone(),
            chain.expiry,
            vec![
                LegOrder {
                    contract: otm_buy.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: otm_sell.clone(),
                    quantity: -units,
                },
                LegOrder {
                    contract: itm_buy.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: itm_sell.clone(),
                    quantity: -units,
                },
            ],
        ))
    }
}

/// Iron condor: short OTM call and put near the money, long wings further out.
#[derive(Debug, Clone, Copy)]
pub struct IronCondor {
    tiers: IronCondorTiers,
}

impl IronCondor {
    #[must_use]
    pub const fn new(tiers: IronCondorTiers) -> Self {
        Self { tiers }
    }
}

impl OptionStrategy for IronCondor {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IronCondor
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let kind = self.kind();
        let calls = otm_ladder(&chain.calls);
        let puts = otm_ladder(&chain.puts);
        let call_sell = pick_tier(&calls, self.tiers.call_sell, kind, "OTM call")?;
        let call_buy = pick_tier(&calls, self.tiers.call_buy, kind, "OTM call")?;
        let put_sell = pick_tier(&puts, self.tiers.put_sell, kind, "OTM put")?;
        let put_buy = pick_tier(&puts, self.tiers.put_buy, kind, "OTM put")?;

        let premium = call_buy.ask + put_buy.ask + call_sell.bid + put_sell.bid;
        let units = Sizing::require_nonzero(sizing.margin_units(funds, premium), kind)?;

        debug!(
            underlying = %chain.underlying,
            call_sell = %call_sell.strike,
            call_buy = %call_buy.strike,
            put_sell = %put_sell.strike,
            put_buy = %put_buy.strike,
            units,
            "Iron condor legs selected"
        );

        Ok(StrategyOrder::new(
            kind,
            chain.underlying.clone(),
            chain.expiry,
            vec![
                LegOrder {
                    contract: call_sell.clone(),
                    quantity: -units,
                },
                LegOrder {
                    contract: put_sell.clone(),
                    quantity: -units,
                },
                LegOrder {
                    contract: call_buy.clone(),
                    quantity: units,
                },
                LegOrder {
                    contract: put_buy.clone(),
                    quantity: units,
                },
            ],
        ))
    }
}
