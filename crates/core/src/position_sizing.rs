use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Shares per standard US equity option contract.
pub const CONTRACT_MULTIPLIER: i32 = 100;

/// Funds the host reports at the moment of entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFunds {
    /// Total portfolio value (cash plus marked holdings).
    pub portfolio_value: Decimal,
    /// Margin still available for new positions.
    pub margin_remaining: Decimal,
}

/// Whole contracts needed so one leg is worth `fraction` of the portfolio.
///
/// # Arguments
/// * `portfolio_value` - Total portfolio value
/// * `fraction` - Target share of the portfolio for this leg (0.0-1.0)
/// * `price` - Per-share option price, multiplied by [`CONTRACT_MULTIPLIER`]
///
/// # Returns
/// Contract count, floored. Zero when any input is non-positive.
#[must_use]
pub fn target_fraction_quantity(portfolio_value: Decimal, fraction: f64, price: Decimal) -> i32 {
    let Ok(fraction) = Decimal::try_from(fraction) else {
        return 0;
    };
    let contract_cost = price * Decimal::from(CONTRACT_MULTIPLIER);
    if portfolio_value <= Decimal::ZERO || fraction <= Decimal::ZERO || contract_cost <= Decimal::ZERO {
        return 0;
    }

    whole_contracts(portfolio_value * fraction / contract_cost)
}

/// Whole multi-leg units affordable with `use_ratio` of the remaining margin.
///
/// `premium` is the aggregate per-share premium of one unit across all legs.
#[must_use]
pub fn margin_quantity(margin_remaining: Decimal, use_ratio: f64, premium: Decimal) -> i32 {
    let Ok(use_ratio) = Decimal::try_from(use_ratio) else {
        return 0;
    };
    let unit_cost = premium * Decimal::from(CONTRACT_MULTIPLIER);
    if margin_remaining <= Decimal::ZERO || use_ratio <= Decimal::ZERO || unit_cost <= Decimal::ZERO {
        return 0;
    }

    whole_contracts(margin_remaining * use_ratio / unit_cost)
}

fn whole_contracts(raw: Decimal) -> i32 {
    raw.floor().to_i32().unwrap_or(0).max(0)
}
