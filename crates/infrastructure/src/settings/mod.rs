//! Layered settings: defaults, then a TOML file, then `COURTYARD_*`
//! environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use courtyard_domain::{ClientSettings, DomainError};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `COURTYARD_BASE_URL`.
pub const ENV_PREFIX: &str = "COURTYARD";

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the settings shape.
    #[error("Failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    /// Settings parsed but failed validation.
    #[error("Invalid settings: {0}")]
    Invalid(#[from] DomainError),
}

/// Builds [`ClientSettings`] from its sources.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    path: Option<PathBuf>,
    required: bool,
    env: Option<HashMap<String, String>>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            required: false,
            env: None,
        }
    }
}

impl SettingsLoader {
    /// Loader reading the platform default file, if present.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from `path`, which must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self.required = true;
        self
    }

    /// Replaces the process environment with `vars`.
    #[must_use]
    pub fn with_env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// `<config dir>/courtyard/settings.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("courtyard").join("settings.toml"))
    }

    /// File this loader reads, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads and validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `Config` when a required file is missing or a value has the
    /// wrong type, and `Invalid` when a value is out of range.
    pub fn load(&self) -> Result<ClientSettings, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = &self.path {
            tracing::debug!(
                path = %path.display(),
                required = self.required,
                "Reading settings file"
            );
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(self.required),
            );
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(self.env.clone().map(|vars| vars.into_iter().collect()));

        let settings: ClientSettings = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
