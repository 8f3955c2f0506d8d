//! Position monitoring: checks recorded legs against the host's holdings.

use tracing::debug;
use volspread_core::{HeldPosition, Host};

/// Legs of `position` the host reports no holding for.
///
/// Orders are fire-and-forget, so a leg the host silently dropped only shows
/// up here, one evaluation cycle after entry.
#[must_use]
pub fn unfilled_legs<H: Host + ?Sized>(host: &H, position: &HeldPosition) -> Vec<String> {
    let missing: Vec<String> = position
        .legs()
        .iter()
        .filter(|leg| !host.is_invested(&leg.symbol))
        .map(|leg| leg.symbol.clone())
        .collect();

    debug!(
        strategy = %position.strategy(),
        legs = position.legs().len(),
        unfilled = missing.len(),
        "Reconciled position legs"
    );

    missing
}
