//! Historic volatility of one symbol from a closes file.

use anyhow::{bail, Result};
use clap::Args;
use std::path::Path;
use volspread_backtest::data_provider::load_closes;
use volspread_core::historic_volatility;

/// Arguments for the hv command.
#[derive(Args, Debug, Clone)]
pub struct HvArgs {
    /// Daily closes CSV (`date,symbol,close`)
    #[arg(long)]
    pub closes: String,

    /// Symbol to measure
    #[arg(long)]
    pub symbol: String,

    /// Number of most recent closes in the window
    #[arg(long, default_value_t = 30)]
    pub days: usize,
}

/// Runs the hv command.
///
/// # Errors
/// Returns an error if the file fails to load or the window cannot be measured.
pub fn run_hv(args: &HvArgs) -> Result<()> {
    let closes = load_closes(Path::new(&args.closes))?;
    let series: Vec<f64> = closes
        .iter()
        .filter(|c| c.symbol == args.symbol)
        .map(|c| c.close)
        .collect();
    if series.is_empty() {
        bail!("no closes for {} in {}", args.symbol, args.closes);
    }

    let window = &series[series.len().saturating_sub(args.days)..];
    let hv = historic_volatility(window)?;
    tracing::debug!(symbol = %args.symbol, closes = window.len(), hv, "Historic volatility");

    println!("{} HV({}) = {hv}", args.symbol, window.len());
    Ok(())
}
