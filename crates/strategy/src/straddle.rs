use tracing::debug;
use volspread_core::{AccountFunds, EngineResult, Side, StrategyKind, TradedChain};

use crate::builder::{OptionStrategy, Sizing};
use crate::order::{LegOrder, StrategyOrder};
use crate::selection::atm_pair;

/// ATM call plus ATM put at equal size; bought for the long slot, sold for the short one.
#[derive(Debug, Clone, Copy)]
pub struct Straddle {
    direction: Side,
}

impl Straddle {
    #[must_use]
    pub const fn long() -> Self {
        Self {
            direction: Side::Long,
        }
    }

    #[must_use]
    pub const fn short() -> Self {
        Self {
            direction: Side::Short,
        }
    }
}

impl OptionStrategy for Straddle {
    fn kind(&self) -> StrategyKind {
        match self.direction {
            Side::Long => StrategyKind::Straddle,
            Side::Short => StrategyKind::ShortStraddle,
        }
    }

    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder> {
        let (call, put) = atm_pair(chain)?;
        let size = Sizing::require_nonzero(sizing.equal_legs(funds, &[call, put]), self.kind())?;
        let quantity = match self.direction {
            Side::Long => size,
            Side::Short => -size,
        };

        debug!(
            underlying = %chain.underlying,
            strategy = %self.kind(),
            call = %call.display_name(),
            put = %put.display_name(),
            spot = %call.underlying_price,
            quantity,
            "Straddle legs selected"
        );

        Ok(StrategyOrder::new(
            self.kind(),
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
