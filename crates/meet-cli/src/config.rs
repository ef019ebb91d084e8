//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Pool length in metres; used to label splits recorded without a label.
    pub split_distance_m: u32,

    /// Reject unparseable manual edits instead of dropping the bad fields.
    pub strict_edits: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("meet.db"),
            split_distance_m: 50,
            strict_edits: false,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MEET_*)
        figment = figment.merge(Env::prefixed("MEET_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for meet.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("meet"))
}

/// Returns the platform-specific data directory for meet.
///
/// On Linux: `~/.local/share/meet`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("meet"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_meet() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "meet");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("meet.db"));
        assert_eq!(config.split_distance_m, 50);
        assert!(!config.strict_edits);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("meet.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/other.db\"\nsplit_distance_m = 25\nstrict_edits = true\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.split_distance_m, 25);
        assert!(config.strict_edits);
    }
}
