//! Generic loader for the YAML files holding notification definitions.

use std::{
    fs,
    path::{Path, PathBuf},
};

use config::{Config, File, FileFormat};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Reads one list of definitions out of a YAML file.
pub struct ConfigLoader {
    path: PathBuf,
}

/// Why a definition file could not be loaded.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file is missing or unreadable.
    #[error("Failed to read definition file: {0}")]
    IoError(#[from] std::io::Error),

    /// Broken YAML, a missing top-level key, or entries of the wrong shape.
    #[error("Failed to parse definitions: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Only `.yaml` and `.yml` files are accepted.
    #[error("Unsupported definition file format")]
    UnsupportedFormat,
}

impl ConfigLoader {
    /// Creates a loader for the file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The file this loader reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserializes the list stored under the top-level `key`, e.g.
    /// `managed_notifications`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, LoaderError> {
        let extension = self.path.extension().and_then(|ext| ext.to_str());
        if !matches!(extension, Some("yaml" | "yml")) {
            return Err(LoaderError::UnsupportedFormat);
        }

        let raw = fs::read_to_string(&self.path)?;
        let parsed = Config::builder().add_source(File::from_str(&raw, FileFormat::Yaml)).build()?;
        Ok(parsed.get(key)?)
    }
}
