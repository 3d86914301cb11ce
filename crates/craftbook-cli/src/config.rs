//! Command-line configuration.
//!
//! Provides the data file location, backup policy, and resolution limits.
//! Configuration can be loaded from and saved to a TOML file.

use craftbook_core::{ResolveLimits, MAX_SUPPORTED_DEPTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "craftbook.toml";

/// Craftbook configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftbookConfig {
    // === Storage ===
    /// Store snapshot read at startup and written after every change
    pub data_file: PathBuf,
    /// Directory holding timestamped backups
    pub backup_dir: PathBuf,
    /// Write a backup after every change
    pub auto_backup: bool,
    /// Number of backups kept; older ones are pruned
    pub max_backups: usize,

    // === Resolution ===
    /// Maximum nested recipes along one ingredient chain
    pub max_depth: usize,
}

impl Default for CraftbookConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("craftbook.json"),
            backup_dir: PathBuf::from("backups"),
            auto_backup: true,
            max_backups: 5,
            max_depth: craftbook_core::DEFAULT_MAX_DEPTH,
        }
    }
}

impl CraftbookConfig {
    /// Reads settings from `path`.
    ///
    /// A missing or unparsable file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("No config at {}, using built-in settings", path.display());
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| format!("cannot read: {e}"))
            .and_then(|text| toml::from_str::<Self>(&text).map_err(|e| e.to_string()));

        let mut config = match parsed {
            Ok(config) => {
                debug!("Using config {}", path.display());
                config
            },
            Err(reason) => {
                warn!("Ignoring config {}: {reason}", path.display());
                Self::default()
            },
        };

        config.validate();
        config
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.max_backups = self.max_backups.clamp(1, 100);
        self.max_depth = self.max_depth.clamp(1, MAX_SUPPORTED_DEPTH);
    }

    /// Resolution limits for the core.
    #[must_use]
    pub const fn limits(&self) -> ResolveLimits {
        ResolveLimits::with_max_depth(self.max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CraftbookConfig::default();
        assert_eq!(config.data_file, PathBuf::from("craftbook.json"));
        assert_eq!(config.max_backups, 5);
        assert!(config.auto_backup);
        assert_eq!(config.limits(), ResolveLimits::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CraftbookConfig {
            max_backups: 0,
            max_depth: 0,
            ..CraftbookConfig::default()
        };

        config.validate();

        assert_eq!(config.max_backups, 1);
        assert_eq!(config.max_depth, 1);

        config.max_depth = 10_000;
        config.validate();
        assert_eq!(config.max_depth, MAX_SUPPORTED_DEPTH);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config = CraftbookConfig {
            data_file: PathBuf::from("kitchen.json"),
            auto_backup: false,
            max_depth: 32,
            ..CraftbookConfig::default()
        };

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = CraftbookConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "max_backups = 9\n").expect("write");

        let loaded = CraftbookConfig::load_from(&config_path);
        assert_eq!(loaded.max_backups, 9);
        assert_eq!(loaded.backup_dir, PathBuf::from("backups"));
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = CraftbookConfig::load_from("/nonexistent/path/craftbook.toml");
        assert_eq!(config, CraftbookConfig::default());
    }

    #[test]
    fn test_config_load_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "max_depth = \"deep\"").expect("write");

        assert_eq!(CraftbookConfig::load_from(&config_path), CraftbookConfig::default());
    }
}
