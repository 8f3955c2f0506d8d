//! Realized volatility and the small amount of descriptive statistics the
//! engine needs.
//!
//! All statistics run in `f64`: log returns and square roots have no exact
//! decimal representation anyway.

use crate::error::{EngineError, EngineResult};

/// Trading days used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Decimal places kept on volatility figures and spreads.
pub const VOL_DECIMALS: i32 = 4;

/// Rounds half away from zero to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// One-period log returns `ln(p[i]) - ln(p[i-1])`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPrice`] if any price is zero, negative or not finite.
pub fn log_returns(prices: &[f64]) -> EngineResult<Vec<f64>> {
    if let Some(&bad) = prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(EngineError::InvalidPrice { value: bad });
    }
    Ok(prices.windows(2).map(|w| w[1].ln() - w[0].ln()).collect())
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (divides by `n - 1`). Needs at least two values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Annualized historic volatility of a daily close series, rounded to 4 places.
///
/// Takes the population standard deviation of the one-day log returns and scales
/// it by `sqrt(252)`. `prices` must be oldest-first.
///
/// # Errors
///
/// - [`EngineError::InsufficientData`] with fewer than two prices
/// - [`EngineError::InvalidPrice`] if a price cannot be log-transformed
pub fn historic_volatility(prices: &[f64]) -> EngineResult<f64> {
    if prices.len() < 2 {
        return Err(EngineError::InsufficientData {
            needed: 2,
            got: prices.len(),
        });
    }

    let returns = log_returns(prices)?;
    let daily_std = population_std_dev(&returns).unwrap_or(0.0);
    let annual = daily_std * TRADING_DAYS_PER_YEAR.sqrt();

    Ok(round_to(annual, VOL_DECIMALS))
}

/// How many sample standard deviations `value` sits above the mean of `history`.
///
/// Returns `None` when the history is too short or has zero dispersion.
#[must_use]
pub fn z_score(value: f64, history: &[f64]) -> Option<f64> {
    let m = mean(history)?;
    let sd = sample_std_dev(history)?;
    if sd <= f64::EPSILON {
        return None;
    }
    Some((value - m) / sd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn thirty_day_series_annualizes_daily_std() {
        // Alternating closes give daily log-return std of about 0.0141.
        let prices: Vec<f64> = [100.0, 101.42].repeat(15);
        let hv = historic_volatility(&prices).unwrap();
        assert!(approx(hv, 0.2237));
    }

    #[test]
    fn matches_reference_formula() {
        let prices: [f64; 5] = [100.0, 101.0, 99.0, 102.0, 100.0];
        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let n = returns.len() as f64;
        let m = returns.iter().sum::<f64>() / n;
        let std = (returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / n).sqrt();
        let expected = (std * 252_f64.sqrt() * 10_000.0).round() / 10_000.0;

        assert!(approx(historic_volatility(&prices).unwrap(), expected));
        assert!(approx(expected, 0.3351));
    }

    #[test]
    fn short_window_uses_two_returns() {
        let hv = historic_volatility(&[100.0, 101.0, 102.0]).unwrap();
        assert!(approx(hv, 0.0008));
    }

    #[test]
    fn flat_prices_have_zero_volatility() {
        assert!(approx(historic_volatility(&[50.0, 50.0, 50.0]).unwrap(), 0.0));
        assert!(approx(historic_volatility(&[100.0, 102.0]).unwrap(), 0.0));
    }

    #[test]
    fn is_invariant_to_price_scale() {
        let base = [100.0, 101.0, 99.0, 102.0, 100.0];
        let scaled: Vec<f64> = base.iter().map(|p| p * 2.0).collect();
        assert!(approx(
            historic_volatility(&base).unwrap(),
            historic_volatility(&scaled).unwrap()
        ));
    }

    #[test]
    fn too_few_prices_is_insufficient_data() {
        assert_eq!(
            historic_volatility(&[100.0]),
            Err(EngineError::InsufficientData { needed: 2, got: 1 })
        );
        assert!(matches!(
            historic_volatility(&[]),
            Err(EngineError::InsufficientData { got: 0, .. })
        ));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        assert!(matches!(
            historic_volatility(&[100.0, 0.0, 101.0]),
            Err(EngineError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn z_score_uses_sample_std_dev() {
        let history = [10.0, 11.0, 12.0, 11.0, 10.0];
        let z = z_score(14.0, &history).unwrap();
        assert!((z - 3.824_731_549_870_058_7).abs() < 1e-9);
    }

    #[test]
    fn z_score_undefined_without_dispersion() {
        assert!(z_score(5.0, &[3.0, 3.0, 3.0]).is_none());
        assert!(z_score(5.0, &[3.0]).is_none());
    }

    #[test]
    fn round_to_keeps_four_places() {
        assert!(approx(round_to(0.123_456, 4), 0.1235));
        assert!(approx(round_to(-0.123_44, 4), -0.1234));
    }
}
