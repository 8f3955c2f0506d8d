use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Option contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

impl std::str::FromStr for OptionRight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "call" => Ok(Self::Call),
            "p" | "put" => Ok(Self::Put),
            other => Err(format!("invalid option right: {other}")),
        }
    }
}

/// Which configured slot a strategy was entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// HV above IV: the configured long-volatility strategy.
    Long,
    /// HV below IV: the configured short-volatility strategy.
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Multi-leg option strategies the builder knows how to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "Straddle")]
    Straddle,
    #[serde(rename = "Short Straddle")]
    ShortStraddle,
    #[serde(rename = "Strangle")]
    Strangle,
    #[serde(rename = "Butterfly")]
    Butterfly,
    #[serde(rename = "Condor")]
    Condor,
    #[serde(rename = "Iron Butterfly")]
    IronButterfly,
    #[serde(rename = "Iron Condor")]
    IronCondor,
}

impl StrategyKind {
    pub const ALL: [Self; 7] = [
        Self::Straddle,
        Self::ShortStraddle,
        Self::Strangle,
        Self::Butterfly,
        Self::Condor,
        Self::IronButterfly,
        Self::IronCondor,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Straddle => "Straddle",
            Self::ShortStraddle => "Short Straddle",
            Self::Strangle => "Strangle",
            Self::Butterfly => "Butterfly",
            Self::Condor => "Condor",
            Self::IronButterfly => "Iron Butterfly",
            Self::IronCondor => "Iron Condor",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One tradable option contract as quoted by the host at the current tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Host identifier used for orders and quotes.
    pub symbol: String,
    pub underlying: String,
    pub right: OptionRight,
    pub strike: Decimal,
    pub expiry: NaiveDate,
    pub bid: Decimal,
    pub ask: Decimal,
    pub implied_volatility: f64,
    /// Spot price of the underlying when the quote was taken.
    pub underlying_price: Decimal,
    /// Host-computed delta, when the pricing model provides one.
    #[serde(default)]
    pub delta: Option<f64>,
}

impl OptionContract {
    /// Absolute distance between spot and strike.
    #[must_use]
    pub fn moneyness_distance(&self) -> Decimal {
        (self.underlying_price - self.strike).abs()
    }

    /// Calls struck above spot, puts struck below spot.
    #[must_use]
    pub fn is_otm(&self) -> bool {
        match self.right {
            OptionRight::Call => self.underlying_price < self.strike,
            OptionRight::Put => self.underlying_price > self.strike,
        }
    }

    /// Calls struck below spot, puts struck above spot.
    #[must_use]
    pub fn is_itm(&self) -> bool {
        match self.right {
            OptionRight::Call => self.underlying_price > self.strike,
            OptionRight::Put => self.underlying_price < self.strike,
        }
    }

    /// Human-readable contract description (e.g., "SPY 470C 2024-01-19").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}{} {}", self.underlying, self.strike, self.right, self.expiry)
    }
}

/// Every tradable contract for one underlying at one instant.
///
/// Built fresh by the host each tick and consumed once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub underlying: String,
    pub contracts: Vec<OptionContract>,
}

impl ChainSnapshot {
    #[must_use]
    pub fn new(underlying: impl Into<String>, contracts: Vec<OptionContract>) -> Self {
        Self {
            underlying: underlying.into(),
            contracts,
        }
    }

    /// Latest expiry present in the snapshot.
    #[must_use]
    pub fn farthest_expiry(&self) -> Option<NaiveDate> {
        self.contracts.iter().map(|c| c.expiry).max()
    }

    /// Restricts the chain to its farthest expiry and splits calls from puts.
    ///
    /// Input order is preserved within each side so later tie-breaks stay stable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyChain`] when either side is empty after filtering.
    pub fn traded_tenor(&self) -> EngineResult<TradedChain> {
        let empty = || EngineError::EmptyChain {
            underlying: self.underlying.clone(),
        };
        let expiry = self.farthest_expiry().ok_or_else(empty)?;

        let (calls, puts): (Vec<_>, Vec<_>) = self
            .contracts
            .iter()
            .filter(|c| c.expiry == expiry)
            .cloned()
            .partition(|c| c.right == OptionRight::Call);

        if calls.is_empty() || puts.is_empty() {
            return Err(empty());
        }

        Ok(TradedChain {
            underlying: self.underlying.clone(),
            expiry,
            calls,
            puts,
        })
    }
}

/// A chain reduced to the single traded tenor, partitioned by right.
///
/// Both sides are guaranteed non-empty.
#[derive(Debug, Clone)]
pub struct TradedChain {
    pub underlying: String,
    pub expiry: NaiveDate,
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
}

/// One held leg of a multi-leg position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub symbol: String,
    pub quantity: i32,
}
