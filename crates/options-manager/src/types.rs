//! Types for options position management.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use volspread_core::{EngineError, Leg, Side, StrategyKind};

/// Volatility comparison for one underlying at one evaluation cycle.
///
/// Derived fresh every cycle and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub historic_vol: f64,
    pub short_historic_vol: f64,
    /// Mean implied vol of the ATM call and put.
    pub implied_vol_avg: f64,
    /// `historic_vol - implied_vol_avg`, rounded to 4 places.
    pub hv_iv_spread: f64,
    /// `short_historic_vol - historic_vol`, rounded to 4 places.
    pub historic_vol_spread: f64,
}

/// Reason a position was closed (or an underlying was benched).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    VolProxySpike,
    Expiration,
    StopLoss,
    BoundBreach,
    ExtremeVolatility,
    HistoricVolSpike,
    UnfilledLeg,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VolProxySpike => write!(f, "vol_proxy_spike"),
            Self::Expiration => write!(f, "expiration"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::BoundBreach => write!(f, "bound_breach"),
            Self::ExtremeVolatility => write!(f, "extreme_volatility"),
            Self::HistoricVolSpike => write!(f, "historic_vol_spike"),
            Self::UnfilledLeg => write!(f, "unfilled_leg"),
        }
    }
}

/// What the risk gate wants done with an underlying this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hold,
    /// Close everything held. `pause` starts a cooldown when set.
    Liquidate {
        reason: ExitReason,
        pause: Option<u32>,
    },
    /// Open the strategy configured for `side`.
    Enter { side: Side },
}

/// Observable outcome of one tick, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    Entry {
        underlying: String,
        side: Side,
        strategy: StrategyKind,
        legs: Vec<Leg>,
        expiration: NaiveDate,
        stop_loss: Option<Decimal>,
        hv_iv_spread: f64,
    },
    /// `closed` is `None` when the underlying was already flat and only the
    /// cooldown applied.
    Exit {
        underlying: String,
        reason: ExitReason,
        closed: Option<StrategyKind>,
        pause: Option<u32>,
    },
    Hedge {
        underlying: String,
        shares: i32,
    },
    PauseCountdown {
        underlying: String,
        remaining: u32,
    },
    Skip {
        underlying: String,
        error: EngineError,
    },
}

impl TickEvent {
    #[must_use]
    pub fn underlying(&self) -> &str {
        match self {
            Self::Entry { underlying, .. }
            | Self::Exit { underlying, .. }
            | Self::Hedge { underlying, .. }
            | Self::PauseCountdown { underlying, .. }
            | Self::Skip { underlying, .. } => underlying,
        }
    }

    /// Short label for summaries.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Entry { .. } => "entry",
            Self::Exit { .. } => "exit",
            Self::Hedge { .. } => "hedge",
            Self::PauseCountdown { .. } => "pause",
            Self::Skip { .. } => "skip",
        }
    }
}
