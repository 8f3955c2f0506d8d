//! Tick dispatcher: runs the kill-switches every tick and the signal
//! evaluation on the configured cadence.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use volspread_core::volatility::historic_volatility;
use volspread_core::{
    AccountFunds, ConfigError, EngineConfig, EngineError, EngineResult, HeldPosition, Host,
    PositionTracker, Side, TradedChain, UnderlyingState,
};
use volspread_strategy::StrategyBuilder;

use crate::gate::decide;
use crate::hedge::hedge_shares;
use crate::monitor::unfilled_legs;
use crate::signal::compute_signal;
use crate::stops::{expires_today, stop_level, stop_triggered, VolProxyMonitor};
use crate::types::{Action, ExitReason, Signal, TickEvent};

/// The decision engine for a universe of underlyings.
///
/// Owns all per-underlying state; the host only ever sees fire-and-forget
/// order and liquidation requests.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    tracker: PositionTracker,
    builder: StrategyBuilder,
    vol_proxy: VolProxyMonitor,
    stop_pct: Decimal,
}

impl Engine {
    /// Creates an engine with every configured underlying flat.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by validation.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::restore(config, PositionTracker::default())
    }

    /// Resumes from a saved tracker. Configured underlyings missing from it
    /// start flat.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by validation.
    pub fn restore(config: EngineConfig, mut tracker: PositionTracker) -> Result<Self, ConfigError> {
        config.validate()?;

        let pct = Decimal::try_from(config.risk.stop_loss_percentage_bound).map_err(|_| {
            ConfigError::InvalidStrategy(format!(
                "stop_loss_percentage_bound {} is not representable",
                config.risk.stop_loss_percentage_bound
            ))
        })?;

        for underlying in &config.universe {
            tracker.track(underlying.clone());
        }

        info!(
            universe = ?config.universe,
            long = %config.strategy.long,
            short = %config.strategy.short,
            vol_proxy = config.vol_proxy.enabled,
            delta_hedge = config.delta_hedge,
            "Engine initialized"
        );

        Ok(Self {
            builder: StrategyBuilder::new(&config.strategy),
            vol_proxy: VolProxyMonitor::new(config.vol_proxy.clone()),
            stop_pct: pct,
            tracker,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    #[must_use]
    pub fn state(&self, underlying: &str) -> Option<&UnderlyingState> {
        self.tracker.get(underlying)
    }

    /// Processes one host tick and reports what happened, in order.
    ///
    /// Kill-switches run first (vol proxy spike, expiration close, stop-loss),
    /// then on evaluation ticks every underlying in the universe is evaluated.
    /// A failure on one underlying is logged and never stops the others.
    pub fn on_tick<H: Host + ?Sized>(&mut self, host: &mut H) -> Vec<TickEvent> {
        let mut events = Vec::new();
        if host.is_warming_up() {
            return events;
        }

        let now = host.current_time();
        let schedule = self.config.schedule;

        self.check_vol_proxy(host, schedule.is_daily_tick(now.time()), &mut events);
        if schedule.is_expiration_close(now.time()) {
            self.close_expiring(host, now.date(), &mut events);
        }
        self.check_stops(host, &mut events);

        if schedule.is_evaluation_tick(now.time()) {
            let universe = self.config.universe.clone();
            for underlying in &universe {
                if let Err(error) = self.evaluate(host, underlying, now, &mut events) {
                    if error.is_routine() {
                        debug!(underlying = %underlying, %error, "Skipped underlying");
                    } else {
                        warn!(underlying = %underlying, %error, "Skipped underlying");
                    }
                    events.push(TickEvent::Skip {
                        underlying: underlying.clone(),
                        error,
                    });
                }
            }
        }

        events
    }

    /// On a proxy spike, closes every Short position and benches every flat
    /// underlying so nothing new opens while the spike lasts. Long positions
    /// are left alone.
    fn check_vol_proxy<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        daily_tick: bool,
        events: &mut Vec<TickEvent>,
    ) {
        if self.vol_proxy.check(&*host, daily_tick).is_none() {
            return;
        }
        let pause = self.vol_proxy.pause_length();

        let flat: Vec<String> = self
            .tracker
            .iter()
            .filter(|(_, state)| state.is_flat())
            .map(|(underlying, _)| underlying.to_string())
            .collect();
        for underlying in &flat {
            if let Some(state) = self.tracker.get_mut(underlying) {
                state.pause(pause);
            }
        }
        if !flat.is_empty() {
            info!(benched = ?flat, pause, "Flat underlyings benched by vol proxy spike");
        }

        for underlying in self.tracker.holding(Side::Short) {
            if let Some(state) = self.tracker.get_mut(&underlying) {
                events.push(exit(host, &underlying, state, ExitReason::VolProxySpike, Some(pause)));
            }
        }
    }

    fn close_expiring<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        today: NaiveDate,
        events: &mut Vec<TickEvent>,
    ) {
        let pause = self.vol_proxy.pause_length();
        let expiring: Vec<String> = self
            .tracker
            .iter()
            .filter(|(_, state)| state.position().is_some_and(|p| expires_today(p, today)))
            .map(|(underlying, _)| underlying.to_string())
            .collect();

        for underlying in expiring {
            if let Some(state) = self.tracker.get_mut(&underlying) {
                events.push(exit(host, &underlying, state, ExitReason::Expiration, Some(pause)));
            }
        }
    }

    fn check_stops<H: Host + ?Sized>(&mut self, host: &mut H, events: &mut Vec<TickEvent>) {
        let pause = self.config.risk.pause_length;
        for underlying in self.tracker.holding(Side::Short) {
            let Some(state) = self.tracker.get_mut(&underlying) else {
                continue;
            };
            let Some(position) = state.position() else {
                continue;
            };
            let stop = position.stop_loss();

            match stop_triggered(&*host, position) {
                Ok(Some(mark)) => {
                    warn!(underlying = %underlying, %mark, stop = ?stop, "Stop-loss triggered");
                    events.push(exit(host, &underlying, state, ExitReason::StopLoss, Some(pause)));
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(underlying = %underlying, %error, "Stop-loss check skipped");
                    events.push(TickEvent::Skip { underlying, error });
                }
            }
        }
    }

    fn evaluate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        underlying: &str,
        now: NaiveDateTime,
        events: &mut Vec<TickEvent>,
    ) -> EngineResult<()> {
        let unknown = || EngineError::UnknownUnderlying(underlying.to_string());
        let bounds = *self.config.bounds_for(underlying).ok_or_else(unknown)?;
        let daily_tick = self.config.schedule.is_daily_tick(now.time());
        let state = self.tracker.get_mut(underlying).ok_or_else(unknown)?;

        if self.config.reconcile_fills {
            let missing = state
                .position()
                .map(|p| unfilled_legs(&*host, p))
                .unwrap_or_default();
            if !missing.is_empty() {
                warn!(underlying, missing = ?missing, "Legs never filled, unwinding position");
                events.push(exit(host, underlying, state, ExitReason::UnfilledLeg, None));
                return Ok(());
            }
        }

        if state.is_paused() {
            if daily_tick && state.decrement_pause(now.date()) {
                let remaining = state.pause_counter();
                info!(underlying, remaining, "Pause countdown");
                events.push(TickEvent::PauseCountdown {
                    underlying: underlying.to_string(),
                    remaining,
                });
            } else {
                debug!(underlying, remaining = state.pause_counter(), "Paused, evaluation skipped");
            }
            return Ok(());
        }

        let chain = host
            .chain_snapshot(underlying)
            .ok_or_else(|| EngineError::EmptyChain {
                underlying: underlying.to_string(),
            })?
            .traded_tenor()?;

        let windows = self.config.volatility;
        let historic_vol = historic_volatility(&host.daily_closes(underlying, windows.hv_period))?;
        let short_historic_vol =
            historic_volatility(&host.daily_closes(underlying, windows.short_hv_period))?;
        let signal = compute_signal(historic_vol, short_historic_vol, &chain)?;

        debug!(
            underlying,
            hv = signal.historic_vol,
            short_hv = signal.short_historic_vol,
            iv = signal.implied_vol_avg,
            spread = signal.hv_iv_spread,
            hv_spread = signal.historic_vol_spread,
            "Signal computed"
        );

        match decide(state.side(), &signal, &bounds, self.config.risk.pause_length) {
            Action::Hold => Ok(()),
            Action::Liquidate { reason, pause } => {
                events.push(exit(host, underlying, state, reason, pause));
                Ok(())
            }
            Action::Enter { side } => self.enter(host, underlying, side, &chain, &signal, events),
        }
    }

    fn enter<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        underlying: &str,
        side: Side,
        chain: &TradedChain,
        signal: &Signal,
        events: &mut Vec<TickEvent>,
    ) -> EngineResult<()> {
        let strategy = match side {
            Side::Long => self.config.strategy.long,
            Side::Short => self.config.strategy.short,
        };
        let funds = AccountFunds {
            portfolio_value: host.portfolio_value(),
            margin_remaining: host.margin_remaining(),
        };
        let order = self.builder.build(strategy, chain, &funds)?;

        let position = match side {
            Side::Long => HeldPosition::long(strategy, order.held_legs(), order.expiry),
            Side::Short => HeldPosition::short(
                strategy,
                order.held_legs(),
                order.expiry,
                stop_level(order.close_cost(), self.stop_pct),
            ),
        };
        let stop_loss = position.stop_loss();
        let legs = position.legs().to_vec();

        let state = self
            .tracker
            .get_mut(underlying)
            .ok_or_else(|| EngineError::UnknownUnderlying(underlying.to_string()))?;
        if let Err(rejected) = state.open(position) {
            warn!(underlying, strategy = %rejected.strategy(), "Entry refused: position already open");
            return Ok(());
        }

        for leg in &order.legs {
            host.place_order(&leg.contract.symbol, leg.quantity);
        }

        info!(
            underlying,
            strategy = %strategy,
            side = %side,
            spread = signal.hv_iv_spread,
            legs = legs.len(),
            expiration = %order.expiry,
            stop_loss = ?stop_loss,
            "Entered position"
        );
        events.push(TickEvent::Entry {
            underlying: underlying.to_string(),
            side,
            strategy,
            legs,
            expiration: order.expiry,
            stop_loss,
            hv_iv_spread: signal.hv_iv_spread,
        });

        if self.config.delta_hedge {
            if let Some(shares) = hedge_shares(&order) {
                host.place_order(underlying, shares);
                info!(underlying, shares, "Delta hedged");
                events.push(TickEvent::Hedge {
                    underlying: underlying.to_string(),
                    shares,
                });
            }
        }

        Ok(())
    }
}

/// Liquidates every held leg plus the underlying, returns the state to flat
/// and applies `pause` if set. Safe to call on a flat underlying.
fn exit<H: Host + ?Sized>(
    host: &mut H,
    underlying: &str,
    state: &mut UnderlyingState,
    reason: ExitReason,
    pause: Option<u32>,
) -> TickEvent {
    let closed = state.close();
    if let Some(position) = &closed {
        for leg in position.legs() {
            host.liquidate(&leg.symbol);
        }
    }
    host.liquidate(underlying);
    if let Some(days) = pause {
        state.pause(days);
    }

    match &closed {
        Some(position) => info!(
            underlying,
            strategy = %position.strategy(),
            %reason,
            pause = ?pause,
            "Position closed"
        ),
        None => debug!(underlying, %reason, pause = ?pause, "Flat underlying benched"),
    }

    TickEvent::Exit {
        underlying: underlying.to_string(),
        reason,
        closed: closed.map(|p| p.strategy()),
        pause,
    }
}
