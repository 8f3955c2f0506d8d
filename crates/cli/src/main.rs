use clap::{Parser, Subcommand};

mod commands;

use commands::{CheckConfigArgs, HvArgs, ReplayArgs};

#[derive(Parser)]
#[command(name = "volspread")]
#[command(about = "HV/IV spread options engine", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded closes and option chains through the engine
    Replay(ReplayArgs),
    /// Print the annualized historic volatility of a symbol
    Hv(HvArgs),
    /// Validate a configuration and print the effective values
    CheckConfig(CheckConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Replay(args) => commands::run_replay(&args)?,
        Commands::Hv(args) => commands::run_hv(&args)?,
        Commands::CheckConfig(args) => commands::run_check_config(&args)?,
    }

    Ok(())
}
