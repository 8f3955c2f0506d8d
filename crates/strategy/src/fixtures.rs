//! Synthetic option chains for unit tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use volspread_core::{AccountFunds, ChainSnapshot, OptionContract, OptionRight, TradedChain};

pub fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 19).unwrap()
}

pub fn contract(right: OptionRight, strike: Decimal, spot: Decimal) -> OptionContract {
    let intrinsic = match right {
        OptionRight::Call => (spot - strike).max(Decimal::ZERO),
        OptionRight::Put => (strike - spot).max(Decimal::ZERO),
    };
    let ask = intrinsic + dec!(1.00);
    let delta = match right {
        OptionRight::Call => 0.5,
        OptionRight::Put => -0.5,
    };
    OptionContract {
        symbol: format!("SPY {strike}{right}"),
        underlying: "SPY".to_string(),
        right,
        strike,
        expiry: expiry(),
        bid: ask - dec!(0.10),
        ask,
        implied_volatility: 0.20,
        underlying_price: spot,
        delta: Some(delta),
    }
}

/// Strikes 90..=110 for both rights, ascending.
pub fn snapshot(spot: Decimal) -> ChainSnapshot {
    let mut contracts = Vec::new();
    for right in [OptionRight::Call, OptionRight::Put] {
        for strike in 90..=110 {
            contracts.push(contract(right, Decimal::from(strike), spot));
        }
    }
    ChainSnapshot::new("SPY", contracts)
}

pub fn chain(spot: Decimal) -> TradedChain {
    snapshot(spot).traded_tenor().unwrap()
}

pub fn funds() -> AccountFunds {
    AccountFunds {
        portfolio_value: dec!(1000000),
        margin_remaining: dec!(200000),
    }
}
