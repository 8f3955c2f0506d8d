use volspread_core::config::{StrategyConfig, TierConfig};
use volspread_core::position_sizing::{margin_quantity, target_fraction_quantity};
use volspread_core::{AccountFunds, EngineError, EngineResult, OptionContract, StrategyKind, TradedChain};

use crate::butterfly::{Butterfly, IronButterfly};
use crate::condor::{Condor, IronCondor};
use crate::order::StrategyOrder;
use crate::straddle::Straddle;
use crate::strangle::Strangle;

/// A multi-leg recipe that turns a traded chain into signed contract quantities.
pub trait OptionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Selects contracts and sizes every leg.
    ///
    /// # Errors
    ///
    /// - [`EngineError::TierUnavailable`] when a required tier is missing
    /// - [`EngineError::ZeroSizeOrder`] when sizing comes out at zero
    fn build(
        &self,
        chain: &TradedChain,
        funds: &AccountFunds,
        sizing: &Sizing,
    ) -> EngineResult<StrategyOrder>;
}

/// Order sizing knobs shared by every recipe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizing {
    /// Portfolio share per leg for straddles and strangles.
    pub target_fraction: f64,
    /// Share of remaining margin for the margin-sized spreads.
    pub margin_use_ratio: f64,
}

impl Sizing {
    /// Equal size across legs: the smallest per-leg target-fraction quantity.
    #[must_use]
    pub fn equal_legs(&self, funds: &AccountFunds, legs: &[&OptionContract]) -> i32 {
        legs.iter()
            .map(|c| target_fraction_quantity(funds.portfolio_value, self.target_fraction, c.ask))
            .min()
            .unwrap_or(0)
    }

    /// Units affordable for a spread whose legs cost `premium` per share in total.
    #[must_use]
    pub fn margin_units(&self, funds: &AccountFunds, premium: rust_decimal::Decimal) -> i32 {
        margin_quantity(funds.margin_remaining, self.margin_use_ratio, premium)
    }

    /// Turns a zero size into the abort error for `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ZeroSizeOrder`] when `size` is not positive.
    pub fn require_nonzero(size: i32, strategy: StrategyKind) -> EngineResult<i32> {
        if size > 0 {
            Ok(size)
        } else {
            Err(EngineError::ZeroSizeOrder { strategy })
        }
    }
}

/// Maps a configured strategy label onto its recipe.
#[derive(Debug, Clone)]
pub struct StrategyBuilder {
    tiers: TierConfig,
    sizing: Sizing,
}

impl StrategyBuilder {
    #[must_use]
    pub const fn new(config: &StrategyConfig) -> Self {
        Self {
            tiers: config.tiers,
            sizing: Sizing {
                target_fraction: config.target_fraction,
                margin_use_ratio: config.margin_use_ratio,
            },
        }
    }

    #[must_use]
    pub fn recipe(&self, kind: StrategyKind) -> Box<dyn OptionStrategy> {
        let tiers = &self.tiers;
        match kind {
            StrategyKind::Straddle => Box::new(Straddle::long()),
            StrategyKind::ShortStraddle => Box::new(Straddle::short()),
            StrategyKind::Strangle => Box::new(Strangle::new(tiers.strangle)),
            StrategyKind::Butterfly => Box::new(Butterfly::new(tiers.butterfly)),
            StrategyKind::Condor => Box::new(Condor::new(tiers.condor)),
            StrategyKind::IronButterfly => Box::new(IronButterfly::new(tiers.iron_butterfly)),
            StrategyKind::IronCondor => Box::new(IronCondor::new(tiers.iron_condor)),
        }
    }

    /// Builds the legs for `kind` against `chain`. Pure: nothing is mutated.
    ///
    /// # Errors
    ///
    /// Propagates the recipe's tier and sizing errors.
    pub fn build(
        &self,
        kind: StrategyKind,
        chain: &TradedChain,
        funds: &AccountFunds,
    ) -> EngineResult<StrategyOrder> {
        let order = self.recipe(kind).build(chain, funds, &self.sizing)?;
        if order.legs.is_empty() {
            return Err(EngineError::ZeroSizeOrder { strategy: kind });
        }
        Ok(order)
    }
}
