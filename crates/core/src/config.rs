use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::StrategyKind;

/// Reasons a configuration is refused at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("universe is empty")]
    EmptyUniverse,

    #[error("no bounds configured for underlying {0}")]
    MissingBounds(String),

    #[error("invalid bounds for {underlying}: {reason}")]
    InvalidBounds { underlying: String, reason: String },

    #[error("invalid volatility windows: {0}")]
    InvalidWindows(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("invalid strategy settings: {0}")]
    InvalidStrategy(String),

    #[error("invalid vol proxy settings: {0}")]
    InvalidVolProxy(String),
}

/// Complete engine configuration. Static once the engine starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Underlyings evaluated each cycle.
    pub universe: Vec<String>,
    /// Spread bounds per underlying. May hold more tickers than the universe.
    pub bounds: BTreeMap<String, UnderlyingBounds>,
    pub volatility: VolatilityConfig,
    pub risk: RiskConfig,
    pub vol_proxy: VolProxyConfig,
    pub strategy: StrategyConfig,
    pub schedule: ScheduleConfig,
    /// Hedge the net option delta with the underlying after each entry.
    pub delta_hedge: bool,
    /// Exit positions whose legs the host never filled.
    pub reconcile_fills: bool,
}

/// HV-IV spread thresholds for one underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingBounds {
    /// Enter short below, exit short above.
    pub short_bound: f64,
    /// Enter long above, exit long below.
    pub long_bound: f64,
    pub extreme_lower: f64,
    pub extreme_upper: f64,
    /// Maximum tolerated short-minus-long historic vol before a forced exit.
    pub vol_spike_bound: f64,
}

impl Default for UnderlyingBounds {
    fn default() -> Self {
        Self {
            short_bound: 1.0,
            long_bound: 1.0,
            extreme_lower: -1.0,
            extreme_upper: 1.0,
            vol_spike_bound: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Daily closes in the long historic-vol window.
    pub hv_period: usize,
    /// Daily closes in the short historic-vol window.
    pub short_hv_period: usize,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            hv_period: 30,
            short_hv_period: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Evaluation days to sit out after an extreme-vol, spike or stop-loss exit.
    pub pause_length: u32,
    /// Stop fires when the short legs' ask total exceeds `(1 + this)` × entry asks.
    pub stop_loss_percentage_bound: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            pause_length: 3,
            stop_loss_percentage_bound: 0.6,
        }
    }
}

/// Market-wide kill-switch driven by a volatility proxy instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolProxyConfig {
    pub enabled: bool,
    pub symbol: String,
    pub lookback_days: usize,
    /// Standard deviations above the trailing mean that count as a spike.
    pub stdev_threshold: f64,
    /// Pause applied after a spike or an expiration close.
    pub pause_length: u32,
}

impl Default for VolProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            symbol: "VIXY".to_string(),
            lookback_days: 30,
            stdev_threshold: 2.25,
            pause_length: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub long: StrategyKind,
    pub short: StrategyKind,
    /// Per-leg portfolio share for straddles and strangles.
    pub target_fraction: f64,
    /// Share of remaining margin committed to margin-sized spreads.
    pub margin_use_ratio: f64,
    pub tiers: TierConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            long: StrategyKind::Straddle,
            short: StrategyKind::ShortStraddle,
            target_fraction: 0.025,
            margin_use_ratio: 0.1,
            tiers: TierConfig::default(),
        }
    }
}

/// Moneyness tiers for the non-ATM legs. Tier 0 is the contract closest to spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub strangle: StrangleTiers,
    pub butterfly: ButterflyTiers,
    pub condor: CondorTiers,
    pub iron_butterfly: IronButterflyTiers,
    pub iron_condor: IronCondorTiers,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            strangle: StrangleTiers { call: 1, put: 1 },
            butterfly: ButterflyTiers { otm: 5, itm: 5 },
            condor: CondorTiers {
                otm_buy: 2,
                otm_sell: 1,
                itm_buy: 2,
                itm_sell: 1,
            },
            iron_butterfly: IronButterflyTiers { wing: 1 },
            iron_condor: IronCondorTiers {
                call_buy: 1,
                call_sell: 0,
                put_buy: 1,
                put_sell: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrangleTiers {
    pub call: usize,
    pub put: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButterflyTiers {
    pub otm: usize,
    pub itm: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondorTiers {
    pub otm_buy: usize,
    pub otm_sell: usize,
    pub itm_buy: usize,
    pub itm_sell: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IronButterflyTiers {
    pub wing: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IronCondorTiers {
    pub call_buy: usize,
    pub call_sell: usize,
    pub put_buy: usize,
    pub put_sell: usize,
}

/// Time-of-day gates, in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Signal evaluation runs on ticks whose minute-of-day is a multiple of this.
    pub evaluation_interval_minutes: u32,
    /// Once-a-day tick: pause decrement and vol-proxy history refresh.
    pub daily_tick: NaiveTime,
    /// Minute at which positions expiring today are closed.
    pub expiration_close: NaiveTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_minutes: 60,
            daily_tick: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            expiration_close: NaiveTime::from_hms_opt(15, 40, 0).unwrap_or_default(),
        }
    }
}

impl ScheduleConfig {
    /// Whether `time` falls on the same hour and minute as `target`.
    #[must_use]
    pub fn same_minute(time: NaiveTime, target: NaiveTime) -> bool {
        time.hour() == target.hour() && time.minute() == target.minute()
    }

    #[must_use]
    pub fn is_evaluation_tick(&self, time: NaiveTime) -> bool {
        let minute_of_day = time.hour() * 60 + time.minute();
        self.evaluation_interval_minutes > 0 && minute_of_day % self.evaluation_interval_minutes == 0
    }

    #[must_use]
    pub fn is_daily_tick(&self, time: NaiveTime) -> bool {
        Self::same_minute(time, self.daily_tick)
    }

    #[must_use]
    pub fn is_expiration_close(&self, time: NaiveTime) -> bool {
        Self::same_minute(time, self.expiration_close)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut bounds = BTreeMap::new();
        bounds.insert(
            "SPY".to_string(),
            UnderlyingBounds {
                short_bound: 0.247,
                ..UnderlyingBounds::default()
            },
        );
        for ticker in ["QQQ", "DIA", "IWM"] {
            bounds.insert(ticker.to_string(), UnderlyingBounds::default());
        }

        Self {
            universe: vec!["SPY".to_string()],
            bounds,
            volatility: VolatilityConfig::default(),
            risk: RiskConfig::default(),
            vol_proxy: VolProxyConfig::default(),
            strategy: StrategyConfig::default(),
            schedule: ScheduleConfig::default(),
            delta_hedge: false,
            reconcile_fills: true,
        }
    }
}

impl EngineConfig {
    /// Bounds for a configured underlying.
    #[must_use]
    pub fn bounds_for(&self, underlying: &str) -> Option<&UnderlyingBounds> {
        self.bounds.get(underlying)
    }

    /// Checks cross-field invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }

        for underlying in &self.universe {
            let bounds = self
                .bounds
                .get(underlying)
                .ok_or_else(|| ConfigError::MissingBounds(underlying.clone()))?;
            validate_bounds(underlying, bounds)?;
        }

        let vol = &self.volatility;
        if vol.short_hv_period < 2 || vol.hv_period < 2 {
            return Err(ConfigError::InvalidWindows(
                "each window needs at least 2 closes".to_string(),
            ));
        }
        if vol.short_hv_period >= vol.hv_period {
            return Err(ConfigError::InvalidWindows(format!(
                "short window {} must be shorter than long window {}",
                vol.short_hv_period, vol.hv_period
            )));
        }

        if !(self.risk.stop_loss_percentage_bound.is_finite()
            && self.risk.stop_loss_percentage_bound >= 0.0)
        {
            return Err(ConfigError::InvalidStrategy(
                "stop_loss_percentage_bound must be a non-negative number".to_string(),
            ));
        }

        self.validate_schedule()?;
        self.validate_strategy()?;

        if self.vol_proxy.enabled {
            if self.vol_proxy.lookback_days < 2 {
                return Err(ConfigError::InvalidVolProxy(
                    "lookback_days must be at least 2".to_string(),
                ));
            }
            if self.vol_proxy.stdev_threshold.is_nan() || self.vol_proxy.stdev_threshold <= 0.0 {
                return Err(ConfigError::InvalidVolProxy(
                    "stdev_threshold must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_schedule(&self) -> Result<(), ConfigError> {
        let schedule = &self.schedule;
        let interval = schedule.evaluation_interval_minutes;
        if interval == 0 || 1440 % interval != 0 {
            return Err(ConfigError::InvalidSchedule(format!(
                "evaluation interval {interval} must divide a day evenly"
            )));
        }
        // Pause decrements happen inside an evaluation cycle, so the daily tick
        // has to land on the evaluation grid.
        if !schedule.is_evaluation_tick(schedule.daily_tick) {
            return Err(ConfigError::InvalidSchedule(format!(
                "daily tick {} is not on the {interval}-minute evaluation grid",
                schedule.daily_tick
            )));
        }
        Ok(())
    }

    fn validate_strategy(&self) -> Result<(), ConfigError> {
        let strategy = &self.strategy;
        if strategy.long == strategy.short {
            return Err(ConfigError::InvalidStrategy(format!(
                "long and short slots both use {}",
                strategy.long
            )));
        }
        for (name, value) in [
            ("target_fraction", strategy.target_fraction),
            ("margin_use_ratio", strategy.margin_use_ratio),
        ] {
            if value.is_nan() || value <= 0.0 || value > 1.0 {
                return Err(ConfigError::InvalidStrategy(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }

        let tiers = &strategy.tiers;
        if tiers.condor.otm_buy == tiers.condor.otm_sell || tiers.condor.itm_buy == tiers.condor.itm_sell {
            return Err(ConfigError::InvalidStrategy(
                "condor buy and sell tiers must differ".to_string(),
            ));
        }
        if tiers.iron_condor.call_buy == tiers.iron_condor.call_sell
            || tiers.iron_condor.put_buy == tiers.iron_condor.put_sell
        {
            return Err(ConfigError::InvalidStrategy(
                "iron condor buy and sell tiers must differ".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_bounds(underlying: &str, bounds: &UnderlyingBounds) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBounds {
        underlying: underlying.to_string(),
        reason: reason.to_string(),
    };

    let values = [
        bounds.short_bound,
        bounds.long_bound,
        bounds.extreme_lower,
        bounds.extreme_upper,
        bounds.vol_spike_bound,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid("bounds must be finite"));
    }
    if bounds.extreme_lower > bounds.extreme_upper {
        return Err(invalid("extreme_lower exceeds extreme_upper"));
    }
    Ok(())
}
