//! Multi-leg option strategy builders.
//!
//! Each recipe turns the traded tenor of a chain plus the account's funds into
//! a [`StrategyOrder`] of signed leg quantities. Recipes never touch the host.

pub mod builder;
pub mod butterfly;
pub mod condor;
pub mod order;
pub mod selection;
pub mod straddle;
pub mod strangle;

#[cfg(test)]
mod fixtures;

pub use builder::{OptionStrategy, Sizing, StrategyBuilder};
pub use order::{LegOrder, StrategyOrder};
