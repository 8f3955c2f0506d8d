//! Error taxonomy for per-underlying evaluation.
//!
//! None of these are fatal to the tick loop. The engine catches them at the
//! per-underlying boundary, logs them and carries on with the next underlying.

use thiserror::Error;

use crate::types::StrategyKind;

/// Errors raised while evaluating a single underlying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Too few price points to compute a volatility estimate.
    #[error("insufficient price history: need at least {needed} closes, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A close price that cannot be log-transformed.
    #[error("non-positive or non-finite close price: {value}")]
    InvalidPrice { value: f64 },

    /// No calls or no puts left after filtering to the traded tenor.
    #[error("no usable option chain for {underlying}")]
    EmptyChain { underlying: String },

    /// A strategy leg asked for a tier the chain does not have.
    #[error("{strategy} needs {side} tier {tier} but only {available} contracts exist")]
    TierUnavailable {
        strategy: StrategyKind,
        side: &'static str,
        tier: usize,
        available: usize,
    },

    /// The sizing policy produced a zero quantity.
    #[error("sizing produced a zero quantity for {strategy}")]
    ZeroSizeOrder { strategy: StrategyKind },

    /// The host had no quote for an instrument the engine needed to price.
    #[error("no quote available for {instrument}")]
    MissingQuote { instrument: String },

    /// The underlying is not part of the configured universe.
    #[error("underlying {0} is not configured")]
    UnknownUnderlying(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Whether the error is routine (expected during normal operation) and only
    /// worth a debug-level log line.
    #[must_use]
    pub const fn is_routine(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::EmptyChain { .. } | Self::ZeroSizeOrder { .. }
        )
    }
}
