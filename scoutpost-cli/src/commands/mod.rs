//! Command handlers -- one module per subcommand

pub mod config;
pub mod containers;
pub mod images;
pub mod networks;
pub mod scan;
pub mod status;
pub mod volumes;

use std::path::Path;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::error::{ConfigError, ScoutpostError};
use scoutpost_engine::{BollardEngineClient, EngineClientConfig};
use scoutpost_scout::{OutputMode, ScoutConfig};

use crate::error::CliError;

/// Effective configuration plus where it came from.
pub struct LoadedConfig {
    pub config: ScoutpostConfig,
    /// `false` when the file was missing and defaults were used.
    pub from_file: bool,
}

/// Load the configuration file, using defaults (plus env overrides) when it
/// does not exist. Any other load failure is an error.
pub async fn load_config(path: &Path) -> Result<LoadedConfig, CliError> {
    match ScoutpostConfig::load(path).await {
        Ok(config) => Ok(LoadedConfig {
            config,
            from_file: true,
        }),
        Err(ScoutpostError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = ScoutpostConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(LoadedConfig {
                config,
                from_file: false,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Connect to the engine API described by `[engine]`.
pub async fn connect_engine(config: &ScoutpostConfig) -> Result<BollardEngineClient, CliError> {
    let client_config = EngineClientConfig::from_core(&config.engine);
    Ok(BollardEngineClient::connect(&client_config).await?)
}

/// Scanner settings from `[engine]` and `[scan]`, with an optional mode override.
pub fn scout_config(config: &ScoutpostConfig, mode: Option<OutputMode>) -> ScoutConfig {
    let mut scout = ScoutConfig::from_core(&config.engine, &config.scan);
    if let Some(mode) = mode {
        scout.output_mode = mode;
    }
    scout
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[serial_test::serial]
    async fn test_load_config_missing_file_uses_defaults() {
        let loaded = load_config(Path::new("/nonexistent/scoutpost.toml"))
            .await
            .expect("missing file falls back to defaults");
        assert!(!loaded.from_file);
        assert_eq!(loaded.config.engine.binary, "docker");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn test_load_config_invalid_file_is_config_error() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("scoutpost.toml");
        std::fs::write(&path, "[scan]\noutput_mode = \"sarif\"\n").expect("write config");

        let err = load_config(&path).await.err().expect("invalid config must fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_scout_config_mode_override() {
        let config = ScoutpostConfig::default();
        assert_eq!(scout_config(&config, None).output_mode, OutputMode::Text);
        assert_eq!(
            scout_config(&config, Some(OutputMode::Structured)).output_mode,
            OutputMode::Structured
        );
    }
}
