//! Delta hedge with the underlying after an entry.

use volspread_strategy::StrategyOrder;

/// Shares of the underlying that flatten the order's net delta.
///
/// `None` when a leg has no delta or the hedge rounds to zero shares.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hedge_shares(order: &StrategyOrder) -> Option<i32> {
    let net = order.net_delta()?;
    let shares = -net.round();
    if !shares.is_finite() || shares == 0.0 || shares.abs() > f64::from(i32::MAX) {
        return None;
    }
    Some(shares as i32)
}
