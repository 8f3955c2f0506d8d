//! Core building blocks for the HV/IV spread options engine.
//!
//! - Domain types: option contracts, chain snapshots, strategy labels
//! - The [`Host`] contract the engine runs against
//! - [`PositionTracker`]: per-underlying lifecycle state
//! - Configuration and its layered loader
//! - Realized volatility and order sizing math

pub mod config;
pub mod config_loader;
pub mod error;
pub mod position;
pub mod position_sizing;
pub mod traits;
pub mod types;
pub mod volatility;

pub use config::{ConfigError, EngineConfig, ScheduleConfig, UnderlyingBounds};
pub use config_loader::ConfigLoader;
pub use error::{EngineError, EngineResult};
pub use position::{unit_close_cost, HeldPosition, PositionTracker, UnderlyingState};
pub use position_sizing::{AccountFunds, CONTRACT_MULTIPLIER};
pub use traits::Host;
pub use types::{ChainSnapshot, Leg, OptionContract, OptionRight, Side, StrategyKind, TradedChain};
pub use volatility::historic_volatility;
