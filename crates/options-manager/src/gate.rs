//! The per-underlying decision rules, evaluated after the kill-switches.
//!
//! Priority: bound breach, extreme volatility, historic vol spike, entry.
//! The first rule that fires wins.

use volspread_core::{Side, UnderlyingBounds};

use crate::types::{Action, ExitReason, Signal};

/// Decides what to do with one unpaused underlying.
///
/// `held` is the side of the open position, `None` when flat. Extreme and
/// spike exits return a pause even when nothing is held: the underlying is
/// benched either way.
#[must_use]
pub fn decide(
    held: Option<Side>,
    signal: &Signal,
    bounds: &UnderlyingBounds,
    pause_length: u32,
) -> Action {
    let spread = signal.hv_iv_spread;

    let breached = match held {
        Some(Side::Long) => spread < bounds.long_bound,
        Some(Side::Short) => spread > bounds.short_bound,
        None => false,
    };
    if breached {
        return Action::Liquidate {
            reason: ExitReason::BoundBreach,
            pause: None,
        };
    }

    if spread < bounds.extreme_lower || spread > bounds.extreme_upper {
        return Action::Liquidate {
            reason: ExitReason::ExtremeVolatility,
            pause: Some(pause_length),
        };
    }

    if signal.historic_vol_spread > bounds.vol_spike_bound {
        return Action::Liquidate {
            reason: ExitReason::HistoricVolSpike,
            pause: Some(pause_length),
        };
    }

    if held.is_some() {
        return Action::Hold;
    }

    if spread > bounds.long_bound && spread <= bounds.extreme_upper {
        Action::Enter { side: Side::Long }
    } else if spread < bounds.short_bound && spread >= bounds.extreme_lower {
        Action::Enter { side: Side::Short }
    } else {
        Action::Hold
    }
}
