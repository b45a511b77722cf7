//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::AppConfig;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".metadata-agent.toml";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("metadata-agent").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(AppConfig::default())
    }

    fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loader_default_paths() {
        let loader = ConfigLoader::new();
        assert!(loader.search_paths()[0].ends_with(LOCAL_CONFIG_FILE));
    }

    #[test]
    fn test_config_loader_returns_defaults_when_no_file() {
        let loader = ConfigLoader::with_path(PathBuf::from("/nonexistent/path.toml"));
        let config = loader.load().unwrap();
        assert_eq!(config.store.output_file, "output.json");
    }

    #[test]
    fn test_config_loader_reads_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[ai]\nmodel = \"gemini-2.0-pro\"\n\n[store]\ndata_dir = \"objects\"\n",
        )
        .unwrap();

        let config = ConfigLoader::with_path(path).load().unwrap();
        assert_eq!(config.ai.model, "gemini-2.0-pro");
        assert_eq!(config.store.data_dir, PathBuf::from("objects"));
    }

    #[test]
    fn test_config_loader_parse_error_names_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[ai\nmodel = ").unwrap();

        let err = ConfigLoader::with_path(path.clone()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
