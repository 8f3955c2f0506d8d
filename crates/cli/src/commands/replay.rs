//! Replays `closes.csv` and `chains.csv` through the engine.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use volspread_backtest::{
    EventSummary, HistoricalDataProvider, PerformanceMetrics, ReplayHost, ReplayReport,
    ReplayRunner, SimulatedExecutionHandler,
};
use volspread_options_manager::{Engine, TickEvent};

/// Arguments for the replay command.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Daily closes CSV (`date,symbol,close`)
    #[arg(long)]
    pub closes: String,

    /// Option chain CSV, one row per contract per timestamp
    #[arg(long)]
    pub chains: String,

    /// Base configuration file
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Profile layered over the base file (`Config.<profile>.toml`)
    #[arg(long, env = "VOLSPREAD_PROFILE")]
    pub profile: Option<String>,

    /// Starting cash
    #[arg(long, default_value = "1000000")]
    pub cash: Decimal,

    /// Commission per contract or share traded
    #[arg(long, default_value = "0")]
    pub commission: Decimal,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    ticks: usize,
    events: EventSummary,
    metrics: &'a PerformanceMetrics,
}

/// Runs the replay command.
///
/// # Errors
/// Returns an error if the configuration or either CSV file fails to load.
pub fn run_replay(args: &ReplayArgs) -> Result<()> {
    let config = super::load_config(&args.config, args.profile.as_deref())?;
    let engine = Engine::new(config).context("engine refused configuration")?;

    let mut provider = HistoricalDataProvider::from_csv(&args.closes, &args.chains)?;
    tracing::info!(
        closes = provider.closes().len(),
        frames = provider.frame_count(),
        "Loaded market data"
    );

    let host = ReplayHost::new(NaiveDateTime::default(), args.cash)
        .with_execution(SimulatedExecutionHandler::new(args.commission));
    let mut runner = ReplayRunner::new(engine, host);
    let report = runner.run(&mut provider);

    if args.json {
        let json = JsonReport {
            ticks: report.ticks,
            events: report.summary(),
            metrics: &report.metrics,
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", format_report(&report));
    }

    Ok(())
}

fn format_report(report: &ReplayReport) -> String {
    let mut lines = Vec::new();
    for event in &report.events {
        if let Some(line) = describe(event) {
            lines.push(line);
        }
    }

    let summary = report.summary();
    let metrics = &report.metrics;
    lines.push(String::new());
    lines.push(format!("Ticks:          {}", report.ticks));
    lines.push(format!("Entries:        {}", summary.entries));
    lines.push(format!("Exits:          {}", summary.exits));
    lines.push(format!("Hedges:         {}", summary.hedges));
    lines.push(format!("Skips:          {}", summary.skips));
    lines.push(format!("Fills:          {}", metrics.num_fills));
    lines.push(format!("Initial equity: {}", metrics.initial_equity.round_dp(2)));
    lines.push(format!("Final equity:   {}", metrics.final_equity.round_dp(2)));
    lines.push(format!(
        "Total return:   {}%",
        (metrics.total_return * Decimal::ONE_HUNDRED).round_dp(2)
    ));
    lines.push(format!(
        "Max drawdown:   {}%",
        (metrics.max_drawdown * Decimal::ONE_HUNDRED).round_dp(2)
    ));
    lines.join("\n")
}

/// One line per entry, exit and hedge. Countdowns and skips only show in the log.
fn describe(event: &TickEvent) -> Option<String> {
    match event {
        TickEvent::Entry {
            underlying,
            side,
            strategy,
            legs,
            expiration,
            hv_iv_spread,
            ..
        } => Some(format!(
            "ENTER {underlying} {side} {strategy} ({} legs, exp {expiration}, spread {hv_iv_spread})",
            legs.len()
        )),
        TickEvent::Exit {
            underlying,
            reason,
            closed: Some(strategy),
            ..
        } => Some(format!("EXIT  {underlying} {strategy} ({reason})")),
        TickEvent::Hedge { underlying, shares } => Some(format!("HEDGE {underlying} {shares:+} shares")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use volspread_core::{Side, StrategyKind};
    use volspread_options_manager::ExitReason;

    #[test]
    fn describe_skips_benching_without_position() {
        let exit = TickEvent::Exit {
            underlying: "SPY".to_string(),
            reason: ExitReason::ExtremeVolatility,
            closed: None,
            pause: Some(3),
        };
        assert!(describe(&exit).is_none());

        let closed = TickEvent::Exit {
            underlying: "SPY".to_string(),
            reason: ExitReason::StopLoss,
            closed: Some(StrategyKind::ShortStraddle),
            pause: Some(3),
        };
        assert_eq!(
            describe(&closed).unwrap(),
            "EXIT  SPY Short Straddle (stop_loss)"
        );
    }

    #[test]
    fn describe_entry_and_hedge() {
        let entry = TickEvent::Entry {
            underlying: "QQQ".to_string(),
            side: Side::Long,
            strategy: StrategyKind::Strangle,
            legs: Vec::new(),
            expiration: NaiveDate::from_ymd_opt(2024, 2, 16).unwrap(),
            stop_loss: None,
            hv_iv_spread: 0.3,
        };
        assert_eq!(
            describe(&entry).unwrap(),
            "ENTER QQQ long Strangle (0 legs, exp 2024-02-16, spread 0.3)"
        );

        let hedge = TickEvent::Hedge {
            underlying: "QQQ".to_string(),
            shares: -500,
        };
        assert_eq!(describe(&hedge).unwrap(), "HEDGE QQQ -500 shares");
    }
}
