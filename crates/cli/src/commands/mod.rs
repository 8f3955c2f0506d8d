//! CLI commands for the HV/IV spread engine.

pub mod check_config;
pub mod hv;
pub mod replay;

pub use check_config::{run_check_config, CheckConfigArgs};
pub use hv::{run_hv, HvArgs};
pub use replay::{run_replay, ReplayArgs};

use anyhow::Result;
use volspread_core::{ConfigLoader, EngineConfig};

/// Loads the layered configuration rooted at `path`.
fn load_config(path: &str, profile: Option<&str>) -> Result<EngineConfig> {
    tracing::info!(path, profile = ?profile, "Loading configuration");
    ConfigLoader::load_from(path, profile)
}
