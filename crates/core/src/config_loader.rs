use crate::config::EngineConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Environment variable prefix; nested keys split on `__`
/// (e.g. `VOLSPREAD_RISK__PAUSE_LENGTH=5`).
pub const ENV_PREFIX: &str = "VOLSPREAD_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the engine configuration by merging built-in defaults, TOML,
    /// environment variables and JSON, then validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load() -> Result<EngineConfig> {
        Self::load_from("config/Config.toml", None)
    }

    /// Loads configuration with a specific profile layered over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<EngineConfig> {
        Self::load_from("config/Config.toml", Some(profile))
    }

    /// Loads from an explicit base path. A profile file sits next to it as
    /// `Config.<profile>.toml`; a `Config.json` next to it is joined last.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>, profile: Option<&str>) -> Result<EngineConfig> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(path));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(dir.join(format!("Config.{profile}.toml"))));
        }
        let config: EngineConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(dir.join("Config.json")))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        config.validate().context("invalid configuration")?;
        tracing::debug!(
            universe = ?config.universe,
            long = %config.strategy.long,
            short = %config.strategy.short,
            "Configuration loaded"
        );

        Ok(config)
    }
}
