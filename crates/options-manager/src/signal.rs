//! HV/IV spread signal.

use volspread_core::volatility::{round_to, VOL_DECIMALS};
use volspread_core::{EngineResult, TradedChain};
use volspread_strategy::selection::atm_pair;

use crate::types::Signal;

/// Combines the two historic vol estimates with the ATM implied vol of the
/// traded tenor.
///
/// # Errors
///
/// Returns [`volspread_core::EngineError::EmptyChain`] when the chain has no
/// calls or no puts.
pub fn compute_signal(
    historic_vol: f64,
    short_historic_vol: f64,
    chain: &TradedChain,
) -> EngineResult<Signal> {
    let (call, put) = atm_pair(chain)?;
    let implied_vol_avg = (call.implied_volatility + put.implied_volatility) / 2.0;

    Ok(Signal {
        historic_vol,
        short_historic_vol,
        implied_vol_avg,
        hv_iv_spread: round_to(historic_vol - implied_vol_avg, VOL_DECIMALS),
        historic_vol_spread: round_to(short_historic_vol - historic_vol, VOL_DECIMALS),
    })
}
