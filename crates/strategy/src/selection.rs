//! Contract selection by moneyness.
//!
//! Every ranking here is a stable sort on `|spot - strike|`, so contracts at
//! equal distance keep the order the host listed them in.

use volspread_core::{EngineError, EngineResult, OptionContract, StrategyKind, TradedChain};

/// The contract closest to spot. Ties go to the first one listed.
#[must_use]
pub fn at_the_money(contracts: &[OptionContract]) -> Option<&OptionContract> {
    contracts.iter().min_by_key(|c| c.moneyness_distance())
}

/// ATM call and put of a traded chain.
///
/// # Errors
///
/// Returns [`EngineError::EmptyChain`] if either side has no contracts.
pub fn atm_pair(chain: &TradedChain) -> EngineResult<(&OptionContract, &OptionContract)> {
    match (at_the_money(&chain.calls), at_the_money(&chain.puts)) {
        (Some(call), Some(put)) => Ok((call, put)),
        _ => Err(EngineError::EmptyChain {
            underlying: chain.underlying.clone(),
        }),
    }
}

fn ladder<'a, F>(contracts: &'a [OptionContract], keep: F) -> Vec<&'a OptionContract>
where
    F: Fn(&OptionContract) -> bool,
{
    let mut ranked: Vec<&OptionContract> = contracts.iter().filter(|c| keep(c)).collect();
    ranked.sort_by_key(|c| c.moneyness_distance());
    ranked
}

/// Out-of-the-money contracts, nearest to spot first.
#[must_use]
pub fn otm_ladder(contracts: &[OptionContract]) -> Vec<&OptionContract> {
    ladder(contracts, OptionContract::is_otm)
}

/// In-the-money contracts, nearest to spot first.
#[must_use]
pub fn itm_ladder(contracts: &[OptionContract]) -> Vec<&OptionContract> {
    ladder(contracts, OptionContract::is_itm)
}

/// Picks `tier` from a moneyness ladder.
///
/// # Errors
///
/// Returns [`EngineError::TierUnavailable`] when the ladder is too short.
pub fn pick_tier<'a>(
    ladder: &[&'a OptionContract],
    tier: usize,
    strategy: StrategyKind,
    side: &'static str,
) -> EngineResult<&'a OptionContract> {
    ladder
        .get(tier)
        .copied()
        .ok_or(EngineError::TierUnavailable {
            strategy,
            side,
            tier,
            available: ladder.len(),
        })
}
