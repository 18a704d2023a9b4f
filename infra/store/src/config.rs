use crate::builder::DEFAULT_ROOT;
use crate::error::{StoreError, StoreErrorExt};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment variables that override file settings (`FSKV__ROOT`, ...).
pub const ENV_PREFIX: &str = "FSKV";

/// Store settings as read from a configuration file and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory of the store, relative or absolute.
    pub root: PathBuf,
    pub create: bool,
    pub atomic_writes: bool,
    /// Indent JSON records.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { root: PathBuf::from(DEFAULT_ROOT), create: true, atomic_writes: true, pretty: true }
    }
}

impl StoreConfig {
    /// Loads settings from an optional file, overlaid with `FSKV__*` environment variables.
    ///
    /// The file format is picked from its extension (`store.toml`, `store.json`, ...).
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns [`StoreError::Config`] if the file is missing or unreadable, or if a value
    /// does not fit its field.
    pub fn load(path: Option<impl AsRef<Path>>) -> Result<Self, StoreError> {
        let mut builder = Config::builder();

        if let Some(path) = &path {
            let path: &Path = path.as_ref();
            info!("Loading store config from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()
            .context("Failed to build store config")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize store config")?;

        Ok(config)
    }

    /// The configured root, or [`DEFAULT_ROOT`] when it is empty.
    #[must_use]
    pub fn effective_root(&self) -> &Path {
        if self.root.as_os_str().is_empty() { Path::new(DEFAULT_ROOT) } else { &self.root }
    }
}
