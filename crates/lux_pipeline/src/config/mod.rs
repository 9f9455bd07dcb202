//! TOML-backed configuration
//!
//! Configuration types implement [`Config`] to pick up file loading and
//! saving for free. Only TOML is supported; the format is chosen by the
//! file extension so a misnamed file fails loudly instead of parsing as
//! the wrong dialect.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but is not valid TOML for this type
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The in-memory value could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file extension names a format this loader does not speak
    #[error("unsupported config format '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Serde-backed configuration with TOML file persistence
pub trait Config: Serialize + DeserializeOwned {
    /// Load a value of this type from a `.toml` file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Save this value to a `.toml` file, replacing any existing content
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Settings for the watcher pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Renderer executable name, looked up on PATH at startup
    pub renderer: String,
    /// Root directory scanned for job markers
    pub watch_root: PathBuf,
    /// Delay between scan passes, in milliseconds
    pub poll_interval_ms: u64,
    /// Render small fixed-resolution previews instead of full output
    pub preview: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            renderer: "luxconsole".to_string(),
            watch_root: PathBuf::from("."),
            poll_interval_ms: 1000,
            preview: false,
        }
    }
}

impl Config for PipelineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.renderer, "luxconsole");
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(!config.preview);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        let config = PipelineConfig {
            renderer: "luxconsole-beta".to_string(),
            watch_root: PathBuf::from("/srv/store"),
            poll_interval_ms: 250,
            preview: true,
        };
        config.save_to_file(&path).unwrap();
        let loaded = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.renderer, "luxconsole-beta");
        assert_eq!(loaded.watch_root, PathBuf::from("/srv/store"));
        assert_eq!(loaded.poll_interval_ms, 250);
        assert!(loaded.preview);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "renderer = \"luxconsole-2\"\n").unwrap();
        let loaded = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.renderer, "luxconsole-2");
        assert_eq!(loaded.poll_interval_ms, 1000);
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let err = PipelineConfig::load_from_file("pipeline.ron").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
