//! Validates a configuration and prints what the engine would run with.

use anyhow::Result;
use clap::Args;

/// Arguments for the check-config command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Base configuration file
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Profile layered over the base file (`Config.<profile>.toml`)
    #[arg(long, env = "VOLSPREAD_PROFILE")]
    pub profile: Option<String>,
}

/// Runs the check-config command.
///
/// # Errors
/// Returns an error if loading or validation fails.
pub fn run_check_config(args: &CheckConfigArgs) -> Result<()> {
    let config = super::load_config(&args.config, args.profile.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    tracing::info!(universe = ?config.universe, "Configuration is valid");
    Ok(())
}
