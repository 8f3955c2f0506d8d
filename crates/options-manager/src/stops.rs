//! Kill-switches that run on every tick, ahead of signal evaluation.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use volspread_core::config::VolProxyConfig;
use volspread_core::volatility::z_score;
use volspread_core::{unit_close_cost, EngineError, EngineResult, HeldPosition, Host};

/// Market-wide spike detector on a volatility proxy instrument.
///
/// Trailing proxy closes are fetched on first use and refreshed on the daily
/// tick; the proxy's current price is compared against them every tick.
#[derive(Debug, Clone)]
pub struct VolProxyMonitor {
    config: VolProxyConfig,
    history: Option<Vec<f64>>,
}

impl VolProxyMonitor {
    #[must_use]
    pub const fn new(config: VolProxyConfig) -> Self {
        Self {
            config,
            history: None,
        }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub const fn pause_length(&self) -> u32 {
        self.config.pause_length
    }

    /// Cached trailing closes, if fetched.
    #[must_use]
    pub fn history(&self) -> Option<&[f64]> {
        self.history.as_deref()
    }

    /// Loads trailing closes when nothing is cached yet or `daily_tick` is set.
    pub fn refresh<H: Host + ?Sized>(&mut self, host: &H, daily_tick: bool) {
        if self.history.is_none() || daily_tick {
            let closes = host.daily_closes(&self.config.symbol, self.config.lookback_days);
            debug!(
                symbol = %self.config.symbol,
                closes = closes.len(),
                "Refreshed vol proxy history"
            );
            self.history = Some(closes);
        }
    }

    /// Standard deviations the proxy's current price sits above its trailing mean.
    ///
    /// `None` when the proxy has no price or the history has no dispersion.
    #[must_use]
    pub fn deviation<H: Host + ?Sized>(&self, host: &H) -> Option<f64> {
        let history = self.history.as_deref()?;
        let price = host.current_price(&self.config.symbol)?.to_f64()?;
        z_score(price, history)
    }

    /// Refreshes if due and reports the deviation when it exceeds the threshold.
    pub fn check<H: Host + ?Sized>(&mut self, host: &H, daily_tick: bool) -> Option<f64> {
        if !self.config.enabled {
            return None;
        }
        self.refresh(host, daily_tick);
        match self.deviation(host) {
            Some(devs) if devs > self.config.stdev_threshold => {
                warn!(
                    symbol = %self.config.symbol,
                    deviations = devs,
                    threshold = self.config.stdev_threshold,
                    "Vol proxy spike"
                );
                Some(devs)
            }
            Some(_) => None,
            None => {
                debug!(symbol = %self.config.symbol, "Vol proxy check skipped: no price or flat history");
                None
            }
        }
    }
}

/// Whether `position` expires on `today`.
#[must_use]
pub fn expires_today(position: &HeldPosition, today: NaiveDate) -> bool {
    position.expiration() == today
}

/// Current per-unit cost to close `position`: short legs bought back at the
/// ask, long legs sold at the bid. See [`unit_close_cost`].
///
/// # Errors
///
/// Returns [`EngineError::MissingQuote`] for the first leg the host cannot quote.
pub fn stop_loss_mark<H: Host + ?Sized>(host: &H, position: &HeldPosition) -> EngineResult<Decimal> {
    let legs = position
        .legs()
        .iter()
        .map(|leg| {
            let price = if leg.quantity < 0 {
                host.ask_price(&leg.symbol)
            } else {
                host.bid_price(&leg.symbol)
            };
            price
                .map(|p| (leg.quantity, p))
                .ok_or_else(|| EngineError::MissingQuote {
                    instrument: leg.symbol.clone(),
                })
        })
        .collect::<EngineResult<Vec<_>>>()?;
    Ok(unit_close_cost(&legs))
}

/// The stop level for a short position: the entry mark moved up by `pct` of
/// its size. For a credit position this is `(1 + pct) × entry_mark`.
#[must_use]
pub fn stop_level(entry_mark: Decimal, pct: Decimal) -> Decimal {
    entry_mark + entry_mark.abs() * pct
}

/// Checks a held short position against its stop.
///
/// Returns the breaching mark when the stop fires. Positions without a stop
/// never fire.
///
/// # Errors
///
/// Propagates [`EngineError::MissingQuote`] from pricing the legs.
pub fn stop_triggered<H: Host + ?Sized>(
    host: &H,
    position: &HeldPosition,
) -> EngineResult<Option<Decimal>> {
    let Some(stop) = position.stop_loss() else {
        return Ok(None);
    };
    let mark = stop_loss_mark(host, position)?;
    Ok((mark > stop).then_some(mark))
}
