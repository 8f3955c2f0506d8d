use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use volspread_backtest::ReplayHost;
use volspread_core::{
    ChainSnapshot, EngineConfig, EngineError, HeldPosition, Host, Leg, OptionContract, OptionRight,
    PositionTracker, Side, StrategyKind,
};
use volspread_options_manager::{Engine, ExitReason, TickEvent};

/// hv 0.2237 over 30 closes, 0.2238 over the last 3.
const CALM: [f64; 2] = [100.0, 101.42];
/// hv 0.7741 over 30 closes, 0.7745 over the last 3.
const WILD: [f64; 2] = [100.0, 105.0];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn at(d: u32, hour: u32, minute: u32) -> NaiveDateTime {
    day(d).and_hms_opt(hour, minute, 0).unwrap()
}

fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 16).unwrap()
}

fn contract(underlying: &str, right: OptionRight, strike: i64, iv: f64) -> OptionContract {
    let spot = dec!(100);
    let strike = Decimal::from(strike);
    let intrinsic = match right {
        OptionRight::Call => (spot - strike).max(Decimal::ZERO),
        OptionRight::Put => (strike - spot).max(Decimal::ZERO),
    };
    let ask = intrinsic + dec!(1.00);
    OptionContract {
        symbol: format!("{underlying} {strike}{right}"),
        underlying: underlying.to_string(),
        right,
        strike,
        expiry: expiry(),
        bid: ask - dec!(0.10),
        ask,
        implied_volatility: iv,
        underlying_price: spot,
        delta: Some(match right {
            OptionRight::Call => 0.6,
            OptionRight::Put => -0.4,
        }),
    }
}

fn chain(underlying: &str, iv: f64) -> ChainSnapshot {
    chain_with_strikes(underlying, iv, 90..=110)
}

fn chain_with_strikes(
    underlying: &str,
    iv: f64,
    strikes: std::ops::RangeInclusive<i64>,
) -> ChainSnapshot {
    let mut contracts = Vec::new();
    for right in [OptionRight::Call, OptionRight::Put] {
        for strike in strikes.clone() {
            contracts.push(contract(underlying, right, strike, iv));
        }
    }
    ChainSnapshot::new(underlying, contracts)
}

fn series(pattern: [f64; 2]) -> Vec<f64> {
    pattern.iter().copied().cycle().take(30).collect()
}

/// A host on 2024-01-02 10:00 with 30 days of closes and a chain for `underlying`.
fn host(underlying: &str, pattern: [f64; 2], iv: f64) -> ReplayHost {
    let mut host = ReplayHost::new(at(2, 10, 0), dec!(1000000));
    host.add_closes(underlying, day(1), &series(pattern));
    host.set_chain(chain(underlying, iv));
    host
}

fn config() -> EngineConfig {
    EngineConfig::default()
}

fn straddle_legs(underlying: &str, quantity: i32) -> Vec<Leg> {
    vec![
        Leg {
            symbol: format!("{underlying} 100C"),
            quantity,
        },
        Leg {
            symbol: format!("{underlying} 100P"),
            quantity,
        },
    ]
}

fn seed(host: &mut ReplayHost, legs: &[Leg]) {
    for leg in legs {
        host.set_quote(&leg.symbol, dec!(0.90), dec!(1.00));
        host.set_holding(&leg.symbol, leg.quantity);
    }
}

#[test]
fn wide_positive_spread_enters_long_straddle() {
    let mut config = config();
    config.bounds.get_mut("SPY").unwrap().long_bound = 0.1;
    let mut engine = Engine::new(config).unwrap();
    let mut host = host("SPY", WILD, 0.4741);

    let events = engine.on_tick(&mut host);

    assert_eq!(events.len(), 1);
    let TickEvent::Entry {
        side,
        strategy,
        legs,
        stop_loss,
        hv_iv_spread,
        ..
    } = &events[0]
    else {
        panic!("expected entry, got {events:?}");
    };
    assert_eq!(*side, Side::Long);
    assert_eq!(*strategy, StrategyKind::Straddle);
    assert_eq!(*hv_iv_spread, 0.3);
    assert!(stop_loss.is_none());
    assert_eq!(legs, &straddle_legs("SPY", 250));

    assert_eq!(host.holding("SPY 100C"), 250);
    assert_eq!(host.holding("SPY 100P"), 250);
    assert_eq!(engine.state("SPY").unwrap().side(), Some(Side::Long));
}

#[test]
fn short_straddle_stop_loss_liquidates_each_leg_once() {
    let mut engine = Engine::new(config()).unwrap();
    let mut host = host("SPY", CALM, 0.20);

    let events = engine.on_tick(&mut host);
    let TickEvent::Entry { stop_loss, legs, .. } = &events[0] else {
        panic!("expected entry, got {events:?}");
    };
    // 1.6 × (1.00 + 1.00)
    assert_eq!(*stop_loss, Some(dec!(3.20)));
    assert_eq!(legs, &straddle_legs("SPY", -250));

    host.set_time(at(2, 10, 5));
    host.set_quote("SPY 100C", dec!(2.40), dec!(2.50));
    let events = engine.on_tick(&mut host);

    assert_eq!(
        events,
        vec![TickEvent::Exit {
            underlying: "SPY".to_string(),
            reason: ExitReason::StopLoss,
            closed: Some(StrategyKind::ShortStraddle),
            pause: Some(3),
        }]
    );
    assert_eq!(host.fills_for("SPY 100C").count(), 2);
    assert_eq!(host.fills_for("SPY 100P").count(), 2);
    assert!(host.holdings().is_empty());

    let state = engine.state("SPY").unwrap();
    assert!(state.is_flat());
    assert_eq!(state.pause_counter(), 3);

    host.set_time(at(2, 10, 10));
    assert!(engine.on_tick(&mut host).is_empty());
    assert_eq!(host.fills().len(), 4);
}

#[test]
fn vol_proxy_spike_only_closes_short_positions() {
    let mut config = config();
    config.universe = vec!["SPY".to_string(), "QQQ".to_string(), "DIA".to_string()];
    config.vol_proxy.enabled = true;

    let mut tracker = PositionTracker::new(["SPY", "QQQ", "DIA"]);
    for (underlying, side) in [("SPY", Side::Short), ("QQQ", Side::Short), ("DIA", Side::Long)] {
        let position = match side {
            Side::Short => HeldPosition::short(
                StrategyKind::ShortStraddle,
                straddle_legs(underlying, -5),
                expiry(),
                dec!(100),
            ),
            Side::Long => HeldPosition::long(StrategyKind::Straddle, straddle_legs(underlying, 5), expiry()),
        };
        tracker.get_mut(underlying).unwrap().open(position).unwrap();
    }
    let mut engine = Engine::restore(config, tracker).unwrap();

    let mut host = ReplayHost::new(at(2, 10, 30), dec!(1000000));
    for underlying in ["SPY", "QQQ"] {
        seed(&mut host, &straddle_legs(underlying, -5));
    }
    seed(&mut host, &straddle_legs("DIA", 5));
    spiking_vixy(&mut host);

    let events = engine.on_tick(&mut host);

    let exited: Vec<&str> = events.iter().map(TickEvent::underlying).collect();
    assert_eq!(exited, vec!["QQQ", "SPY"]);
    assert!(events.iter().all(|e| matches!(
        e,
        TickEvent::Exit {
            reason: ExitReason::VolProxySpike,
            pause: Some(3),
            ..
        }
    )));

    for underlying in ["SPY", "QQQ"] {
        let state = engine.state(underlying).unwrap();
        assert!(state.is_flat());
        assert_eq!(state.pause_counter(), 3);
        assert_eq!(host.holding(&format!("{underlying} 100C")), 0);
    }
    let dia = engine.state("DIA").unwrap();
    assert_eq!(dia.side(), Some(Side::Long));
    assert_eq!(dia.pause_counter(), 0);
    assert_eq!(host.holding("DIA 100C"), 5);
    assert_eq!(host.holding("DIA 100P"), 5);
}

#[test]
fn pause_counts_down_once_per_day_then_allows_entry() {
    let mut tracker = PositionTracker::new(["SPY"]);
    tracker.get_mut("SPY").unwrap().pause(2);
    let mut engine = Engine::restore(config(), tracker).unwrap();
    let mut host = host("SPY", CALM, 0.20);

    assert!(engine.on_tick(&mut host).is_empty());

    host.set_time(at(2, 16, 0));
    assert_eq!(
        engine.on_tick(&mut host),
        vec![TickEvent::PauseCountdown {
            underlying: "SPY".to_string(),
            remaining: 1,
        }]
    );
    // a repeated daily tick on the same date does not count again
    assert!(engine.on_tick(&mut host).is_empty());
    assert_eq!(engine.state("SPY").unwrap().pause_counter(), 1);

    host.set_time(at(3, 16, 0));
    assert_eq!(
        engine.on_tick(&mut host),
        vec![TickEvent::PauseCountdown {
            underlying: "SPY".to_string(),
            remaining: 0,
        }]
    );

    host.set_time(at(4, 10, 0));
    let events = engine.on_tick(&mut host);
    assert!(matches!(events.as_slice(), [TickEvent::Entry { side: Side::Short, .. }]));
}

#[test]
fn expiring_position_closes_at_cutoff() {
    let mut tracker = PositionTracker::new(["SPY"]);
    let legs = straddle_legs("SPY", 5);
    tracker
        .get_mut("SPY")
        .unwrap()
        .open(HeldPosition::long(StrategyKind::Straddle, legs.clone(), day(19)))
        .unwrap();
    let mut engine = Engine::restore(config(), tracker).unwrap();
    let mut host = ReplayHost::new(at(19, 15, 39), dec!(1000000));
    seed(&mut host, &legs);

    assert!(engine.on_tick(&mut host).is_empty());

    host.set_time(at(19, 15, 40));
    assert_eq!(
        engine.on_tick(&mut host),
        vec![TickEvent::Exit {
            underlying: "SPY".to_string(),
            reason: ExitReason::Expiration,
            closed: Some(StrategyKind::Straddle),
            pause: Some(3),
        }]
    );
    assert!(host.holdings().is_empty());
}

#[test]
fn unfilled_leg_unwinds_on_next_cycle() {
    let mut engine = Engine::new(config()).unwrap();
    let mut host = host("SPY", CALM, 0.20);
    assert!(matches!(
        engine.on_tick(&mut host).as_slice(),
        [TickEvent::Entry { .. }]
    ));

    // the host lost the put leg
    host.set_holding("SPY 100P", 0);
    host.set_time(at(2, 11, 0));
    assert_eq!(
        engine.on_tick(&mut host),
        vec![TickEvent::Exit {
            underlying: "SPY".to_string(),
            reason: ExitReason::UnfilledLeg,
            closed: Some(StrategyKind::ShortStraddle),
            pause: None,
        }]
    );
    assert_eq!(host.holding("SPY 100C"), 0);
    let state = engine.state("SPY").unwrap();
    assert!(state.is_flat());
    assert!(!state.is_paused());
}

#[test]
fn delta_hedge_offsets_entry() {
    let mut config = config();
    config.bounds.get_mut("SPY").unwrap().long_bound = 0.1;
    config.delta_hedge = true;
    let mut engine = Engine::new(config).unwrap();
    let mut host = host("SPY", WILD, 0.4741);

    let events = engine.on_tick(&mut host);

    // (0.6 - 0.4) × 250 × 100 = +5000 delta
    assert_eq!(
        events.last(),
        Some(&TickEvent::Hedge {
            underlying: "SPY".to_string(),
            shares: -5000,
        })
    );
    assert_eq!(host.holding("SPY"), -5000);
}

#[test]
fn warm_up_ticks_do_nothing() {
    let mut engine = Engine::new(config()).unwrap();
    let mut host = host("SPY", CALM, 0.20);
    host.set_warming_up(true);

    assert!(engine.on_tick(&mut host).is_empty());
    assert!(host.fills().is_empty());
    assert!(engine.state("SPY").unwrap().is_flat());
}

#[test]
fn off_grid_ticks_skip_evaluation() {
    let mut engine = Engine::new(config()).unwrap();
    let mut host = host("SPY", CALM, 0.20);
    host.set_time(at(2, 10, 30));

    assert!(engine.on_tick(&mut host).is_empty());
    assert!(engine.state("SPY").unwrap().is_flat());
}

#[test]
fn data_gaps_skip_without_state_change() {
    let mut config = config();
    config.universe = vec!["SPY".to_string(), "QQQ".to_string()];
    let mut engine = Engine::new(config).unwrap();

    let mut host = host("SPY", CALM, 0.20);
    host.clear_chains();
    host.set_chain(chain("QQQ", 0.20));

    let events = engine.on_tick(&mut host);
    assert_eq!(
        events,
        vec![
            TickEvent::Skip {
                underlying: "SPY".to_string(),
                error: EngineError::EmptyChain {
                    underlying: "SPY".to_string()
                },
            },
            TickEvent::Skip {
                underlying: "QQQ".to_string(),
                error: EngineError::InsufficientData { needed: 2, got: 0 },
            },
        ]
    );
    assert!(engine.tracker().iter().all(|(_, s)| s.is_flat() && !s.is_paused()));
}

#[test]
fn unaffordable_entry_leaves_underlying_flat() {
    let mut engine = Engine::new(config()).unwrap();
    let mut host = ReplayHost::new(at(2, 10, 0), dec!(1000));
    host.add_closes("SPY", day(1), &series(CALM));
    host.set_chain(chain("SPY", 0.20));

    let events = engine.on_tick(&mut host);
    assert!(matches!(
        events.as_slice(),
        [TickEvent::Skip {
            error: EngineError::ZeroSizeOrder { .. },
            ..
        }]
    ));
    assert!(host.fills().is_empty());
    assert!(engine.state("SPY").unwrap().is_flat());
    assert_eq!(host.portfolio_value(), dec!(1000));
}

fn spiking_vixy(host: &mut ReplayHost) {
    let vixy: Vec<f64> = [10.0, 11.0, 12.0, 11.0, 10.0].iter().copied().cycle().take(30).collect();
    host.add_closes("VIXY", day(1), &vixy);
    host.set_price("VIXY", dec!(30));
}

#[test]
fn flat_underlying_sits_out_vol_proxy_spike() {
    let mut config = config();
    config.vol_proxy.enabled = true;
    let mut engine = Engine::new(config).unwrap();
    let mut host = host("SPY", CALM, 0.20);
    spiking_vixy(&mut host);

    // the spread alone would open a short straddle here
    assert!(engine.on_tick(&mut host).is_empty());
    host.set_time(at(2, 10, 1));
    assert!(engine.on_tick(&mut host).is_empty());

    assert!(host.fills().is_empty());
    let state = engine.state("SPY").unwrap();
    assert!(state.is_flat());
    assert_eq!(state.pause_counter(), 3);

    // once the proxy calms down the bench counts off normally
    host.set_price("VIXY", dec!(11));
    host.set_time(at(2, 16, 0));
    assert_eq!(
        engine.on_tick(&mut host),
        vec![TickEvent::PauseCountdown {
            underlying: "SPY".to_string(),
            remaining: 2,
        }]
    );
}

#[test]
fn short_iron_condor_records_every_leg_and_stop() {
    let mut config = config();
    config.strategy.short = StrategyKind::IronCondor;
    let mut engine = Engine::new(config).unwrap();
    let mut host = host("SPY", CALM, 0.20);

    let events = engine.on_tick(&mut host);

    let TickEvent::Entry {
        side,
        strategy,
        legs,
        stop_loss,
        ..
    } = &events[0]
    else {
        panic!("expected entry, got {events:?}");
    };
    assert_eq!(*side, Side::Short);
    assert_eq!(*strategy, StrategyKind::IronCondor);
    // $1M × 0.1 / ($3.80 × 100) = 263 units
    let expected = vec![
        Leg {
            symbol: "SPY 101C".to_string(),
            quantity: -263,
        },
        Leg {
            symbol: "SPY 99P".to_string(),
            quantity: -263,
        },
        Leg {
            symbol: "SPY 102C".to_string(),
            quantity: 263,
        },
        Leg {
            symbol: "SPY 98P".to_string(),
            quantity: 263,
        },
    ];
    assert_eq!(legs, &expected);
    // close cost 2 × 1.00 - 2 × 0.90 = 0.20, stop 60% above it
    assert_eq!(*stop_loss, Some(dec!(0.32)));

    for leg in &expected {
        assert_eq!(host.holding(&leg.symbol), leg.quantity);
    }
    let position = engine.state("SPY").unwrap().position().unwrap();
    assert_eq!(position.legs(), expected.as_slice());
    assert_eq!(position.stop_loss(), Some(dec!(0.32)));
}

#[test]
fn thin_chain_aborts_butterfly_entry() {
    let mut config = config();
    config.strategy.short = StrategyKind::Butterfly;
    let mut engine = Engine::new(config).unwrap();
    let mut host = ReplayHost::new(at(2, 10, 0), dec!(1000000));
    host.add_closes("SPY", day(1), &series(CALM));
    host.set_chain(chain_with_strikes("SPY", 0.20, 98..=102));

    let events = engine.on_tick(&mut host);

    assert_eq!(
        events,
        vec![TickEvent::Skip {
            underlying: "SPY".to_string(),
            error: EngineError::TierUnavailable {
                strategy: StrategyKind::Butterfly,
                side: "OTM call",
                tier: 5,
                available: 2,
            },
        }]
    );
    let state = engine.state("SPY").unwrap();
    assert!(state.is_flat());
    assert!(!state.is_paused());
    assert!(host.fills().is_empty());
    assert!(host.holdings().is_empty());
}
