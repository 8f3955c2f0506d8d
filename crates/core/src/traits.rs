use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::types::ChainSnapshot;

/// The backtesting or live-trading environment the engine runs inside.
///
/// The host owns the clock, market data, portfolio accounting and order routing.
/// Every call is synchronous and all data for the current tick must already be
/// materialized. `place_order` and `liquidate` are fire-and-forget: the engine
/// never waits for a fill and re-checks holdings on a later cycle instead.
pub trait Host {
    /// Exchange-local time of the current tick.
    fn current_time(&self) -> NaiveDateTime;

    /// True while the host is still replaying warm-up history.
    fn is_warming_up(&self) -> bool {
        false
    }

    /// The last `lookback_days` daily closes for `symbol`, oldest first.
    ///
    /// May return fewer values than requested when history is short.
    fn daily_closes(&self, symbol: &str, lookback_days: usize) -> Vec<f64>;

    /// Option chain for `underlying` at the current tick.
    fn chain_snapshot(&self, underlying: &str) -> Option<ChainSnapshot>;

    /// Last traded price of an equity, index proxy or option.
    fn current_price(&self, instrument: &str) -> Option<Decimal>;

    fn ask_price(&self, contract: &str) -> Option<Decimal>;

    fn bid_price(&self, contract: &str) -> Option<Decimal>;

    fn margin_remaining(&self) -> Decimal;

    fn portfolio_value(&self) -> Decimal;

    /// Whether the portfolio currently holds a non-zero quantity of `instrument`.
    fn is_invested(&self, instrument: &str) -> bool;

    /// Submit a market order for `quantity` (negative sells).
    fn place_order(&mut self, instrument: &str, quantity: i32);

    /// Close any holding in `instrument`. No-op when flat.
    fn liquidate(&mut self, instrument: &str);
}
