use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    pub total_return: Decimal,
    pub max_drawdown: Decimal,
    pub num_fills: usize,
}

/// Tracks the equity curve of a replay.
pub struct MetricsCalculator {
    equity_curve: Vec<Decimal>,
    fills: usize,
}

impl MetricsCalculator {
    /// Creates a new `MetricsCalculator` starting from `initial_capital`.
    #[must_use]
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            equity_curve: vec![initial_capital],
            fills: 0,
        }
    }

    /// Appends the portfolio value observed after a tick.
    pub fn record_equity(&mut self, equity: Decimal) {
        self.equity_curve.push(equity);
    }

    pub fn set_fill_count(&mut self, fills: usize) {
        self.fills = fills;
    }

    #[must_use]
    pub fn calculate(&self) -> PerformanceMetrics {
        let initial = self.equity_curve.first().copied().unwrap_or_default();
        let last = self.equity_curve.last().copied().unwrap_or(initial);
        let total_return = if initial.is_zero() {
            Decimal::ZERO
        } else {
            (last - initial) / initial
        };

        PerformanceMetrics {
            initial_equity: initial,
            final_equity: last,
            total_return,
            max_drawdown: self.calculate_max_drawdown(),
            num_fills: self.fills,
        }
    }

    fn calculate_max_drawdown(&self) -> Decimal {
        let mut max_drawdown = Decimal::ZERO;
        let mut peak = Decimal::ZERO;

        for &equity in &self.equity_curve {
            if equity > peak {
                peak = equity;
            }
            if peak.is_zero() {
                continue;
            }
            let drawdown = (peak - equity) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        max_drawdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn return_and_drawdown_from_curve() {
        let mut calc = MetricsCalculator::new(dec!(100000));
        for equity in [dec!(110000), dec!(88000), dec!(99000), dec!(105000)] {
            calc.record_equity(equity);
        }
        calc.set_fill_count(4);

        let metrics = calc.calculate();
        assert_eq!(metrics.total_return, dec!(0.05));
        // peak 110k → trough 88k
        assert_eq!(metrics.max_drawdown, dec!(0.2));
        assert_eq!(metrics.final_equity, dec!(105000));
        assert_eq!(metrics.num_fills, 4);
    }

    #[test]
    fn flat_curve_has_no_drawdown() {
        let metrics = MetricsCalculator::new(dec!(1000)).calculate();
        assert_eq!(metrics.total_return, Decimal::ZERO);
        assert_eq!(metrics.max_drawdown, Decimal::ZERO);
    }
}
