use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Leg, Side, StrategyKind};

/// An open multi-leg strategy on one underlying.
///
/// The legs, the expiration and the stop-loss live and die together with the
/// position, so a flat underlying can never carry stale contract identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldPosition {
    side: Side,
    strategy: StrategyKind,
    legs: Vec<Leg>,
    expiration: NaiveDate,
    stop_loss: Option<Decimal>,
}

impl HeldPosition {
    /// Position entered through the long-volatility slot. Never carries a stop.
    #[must_use]
    pub fn long(strategy: StrategyKind, legs: Vec<Leg>, expiration: NaiveDate) -> Self {
        Self {
            side: Side::Long,
            strategy,
            legs,
            expiration,
            stop_loss: None,
        }
    }

    /// Position entered through the short-volatility slot with its stop level.
    #[must_use]
    pub fn short(
        strategy: StrategyKind,
        legs: Vec<Leg>,
        expiration: NaiveDate,
        stop_loss: Decimal,
    ) -> Self {
        Self {
            side: Side::Short,
            strategy,
            legs,
            expiration,
            stop_loss: Some(stop_loss),
        }
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    #[must_use]
    pub const fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    #[must_use]
    pub const fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }
}

/// Cost to close one unit of a multi-leg position from `(quantity, close_price)`
/// pairs, where the close price is the ask for short legs and the bid for long ones.
///
/// Each leg is weighted by its quantity over the smallest leg size, so a
/// straddle counts each leg once and a butterfly body twice. Short legs add
/// their buy-back price and long legs subtract their sale price, so a rally in
/// a long wing lowers the cost.
#[must_use]
pub fn unit_close_cost(legs: &[(i32, Decimal)]) -> Decimal {
    let Some(unit) = legs
        .iter()
        .map(|(quantity, _)| quantity.unsigned_abs())
        .filter(|size| *size > 0)
        .min()
    else {
        return Decimal::ZERO;
    };
    let unit = Decimal::from(unit);
    legs.iter()
        .map(|(quantity, price)| -Decimal::from(*quantity) / unit * *price)
        .sum()
}

/// Per-underlying lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingState {
    position: Option<HeldPosition>,
    pause_counter: u32,
    last_pause_decrement: Option<NaiveDate>,
}

impl UnderlyingState {
    #[must_use]
    pub const fn position(&self) -> Option<&HeldPosition> {
        self.position.as_ref()
    }

    /// `None` when flat.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        self.position.as_ref().map(HeldPosition::side)
    }

    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    #[must_use]
    pub const fn pause_counter(&self) -> u32 {
        self.pause_counter
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.pause_counter > 0
    }

    /// Records a freshly entered position, replacing nothing.
    ///
    /// Returns the rejected position back if the underlying is not flat.
    pub fn open(&mut self, position: HeldPosition) -> Result<(), HeldPosition> {
        if self.position.is_some() {
            return Err(position);
        }
        self.position = Some(position);
        Ok(())
    }

    /// Returns to flat, handing back whatever was held.
    pub fn close(&mut self) -> Option<HeldPosition> {
        self.position.take()
    }

    /// Starts (or restarts) a cooldown of `days` evaluation days.
    pub fn pause(&mut self, days: u32) {
        self.pause_counter = days;
    }

    /// Counts one evaluation day off the cooldown, at most once per calendar day.
    ///
    /// Returns `true` if the counter moved.
    pub fn decrement_pause(&mut self, today: NaiveDate) -> bool {
        if self.pause_counter == 0 || self.last_pause_decrement == Some(today) {
            return false;
        }
        self.pause_counter -= 1;
        self.last_pause_decrement = Some(today);
        true
    }
}

/// Owns the state of every configured underlying.
///
/// Iteration order is the ticker order, which keeps tick processing deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionTracker {
    states: BTreeMap<String, UnderlyingState>,
}

impl PositionTracker {
    /// Creates a tracker with a flat, unpaused entry per underlying.
    #[must_use]
    pub fn new<I, S>(underlyings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: underlyings
                .into_iter()
                .map(|u| (u.into(), UnderlyingState::default()))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, underlying: &str) -> Option<&UnderlyingState> {
        self.states.get(underlying)
    }

    pub fn get_mut(&mut self, underlying: &str) -> Option<&mut UnderlyingState> {
        self.states.get_mut(underlying)
    }

    /// Starts tracking `underlying` flat and unpaused. Existing state is kept.
    pub fn track(&mut self, underlying: impl Into<String>) -> &mut UnderlyingState {
        self.states.entry(underlying.into()).or_default()
    }

    pub fn underlyings(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnderlyingState)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Underlyings currently holding a position entered through `side`.
    #[must_use]
    pub fn holding(&self, side: Side) -> Vec<String> {
        self.states
            .iter()
            .filter(|(_, s)| s.side() == Some(side))
            .map(|(k, _)| k.clone())
            .collect()
    }
}
