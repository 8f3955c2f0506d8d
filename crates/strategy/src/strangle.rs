use tracing::debug;
use volspread_core::config::StrangleTiers;
use volspread_core::{AccountFunds, EngineResult, StrategyKind, TradedChain};

use crate::builder::{OptionStrategy, Sizing};
use crate::order::{LegOrder, StrategyOrder};
use crate::selection::{otm_ladder, pick_tier};

/// Long OTM call plus long OTM put at configured tiers.
#[derive(Debug, Clone, Copy)]
pub struct Strangle {
    tiers: StrangleTiers,
}

impl Strangle {
    #[must_use]
    pub const fn new(tiers: StrangleTiers) -> Self {
        Self { tiers }
    }
}

impl OptionStrategy for Strangle {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Strangle
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let kind = self.kind();
        let call = pick_tier(&otm_ladder(&chain.calls), self.tiers.call, kind, "OTM call")?;
        let put = pick_tier(&otm_ladder(&chain.puts), self.tiers.put, kind, "OTM put")?;
        let quantity = Sizing::require_nonzero(sizing.equal_legs(funds, &[call, put]), kind)?;

        debug!(
            underlying = %chain.underlying,
            call_strike = %call.strike,
            put_strike = %put.strike,
            spot = %call.underlying_price,
            quantity,
            "Strangle legs selected"
        );

        Ok(StrategyOrder::new(
            kind,
            chain.underlying.clone(),
            chain.expiry,
            vec![
                LegOrder {
                    contract: call.clone(),
                    quantity,
                },
                LegOrder {
                    contract: put.clone(),
                    quantity,
                },
            ],
        ))
    }
}
