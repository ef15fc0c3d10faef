//! CLI command implementations for Black Forest.

pub(crate) mod map;
pub(crate) mod run;

mod output;

use std::error::Error;
use std::fmt;
use std::path::Path;

use black_forest::config::GameConfig;
use black_forest::error::{ConfigError, SimulationError, WorldError};
use clap::ValueEnum;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Values given on the command line that replace file or default settings.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Overrides {
    /// Map seed.
    pub(crate) seed: Option<u64>,
    /// Map width.
    pub(crate) width: Option<i32>,
    /// Map height.
    pub(crate) height: Option<i32>,
    /// Tick limit.
    pub(crate) max_ticks: Option<u64>,
    /// Force agents to act one after another.
    pub(crate) sequential: bool,
}

impl Overrides {
    fn apply(self, config: &mut GameConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

/// Load `path` (or the defaults), apply `overrides` and validate the result.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the result is unplayable.
pub(crate) fn load_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<GameConfig, CliError> {
    let mut config = match path {
        Some(path) => GameConfig::load(path)
            .map_err(|e| CliError::new(format!("Failed to load {}: {e}", path.display())))?,
        None => GameConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<SimulationError> for CliError {
    fn from(e: SimulationError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<WorldError> for CliError {
    fn from(e: WorldError) -> Self {
        Self::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.toml");
        std::fs::write(&path, "seed = 3\nmax_ticks = 50\n").unwrap();
        let overrides = Overrides {
            seed: Some(11),
            sequential: true,
            ..Overrides::default()
        };
        let config = load_config(Some(path.as_path()), overrides).unwrap();
        assert_eq!(config.seed, 11);
        assert_eq!(config.max_ticks, 50);
        assert!(!config.parallel);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let overrides = Overrides {
            width: Some(8),
            ..Overrides::default()
        };
        let err = load_config(None, overrides).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_config(Some(Path::new("/nonexistent/match.toml")), Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/match.toml"));
    }
}
