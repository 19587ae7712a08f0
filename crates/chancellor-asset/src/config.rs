//! Layered configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `CHANCELLOR_ASSET_ROOT`, `CHANCELLOR_LOG`
//! 2. Project-local: `chancellor.toml`
//! 3. Global: `~/.chancellor/config.toml`

use crate::walker::{WalkOptions, DEFAULT_MAX_DEPTH};
use chancellor_core::{ChancellorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[assets]` table as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub skip_hidden: Option<bool>,
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// `[logging]` table as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChancellorConfigFile {
    #[serde(default)]
    pub assets: AssetSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Resolved asset loading settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    pub root: PathBuf,
    pub skip_hidden: bool,
    pub max_depth: usize,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            skip_hidden: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl AssetSettings {
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            skip_hidden: self.skip_hidden,
            max_depth: self.max_depth,
        }
    }
}

/// Resolved configuration with environment overrides applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChancellorConfig {
    pub assets: AssetSettings,
    /// Default `env_logger` filter, e.g. `info` or `chancellor_asset=debug`
    pub log_level: String,
}

impl Default for ChancellorConfig {
    fn default() -> Self {
        Self {
            assets: AssetSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ChancellorConfig {
    /// Load config with layered precedence: defaults < global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.apply_file(Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from("chancellor.toml");
        if local_path.exists() {
            config.apply_file(Self::load_file(&local_path)?);
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file only (no global or project layer)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(Self::load_file(path)?);
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse config from a TOML string over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ChancellorConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.apply_file(file);
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".chancellor").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ChancellorConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let file: ChancellorConfigFile = toml::from_str(&content).map_err(|e| {
            ChancellorError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(file)
    }

    fn apply_file(&mut self, file: ChancellorConfigFile) {
        if let Some(root) = file.assets.root {
            self.assets.root = root;
        }
        if let Some(skip_hidden) = file.assets.skip_hidden {
            self.assets.skip_hidden = skip_hidden;
        }
        if let Some(max_depth) = file.assets.max_depth {
            self.assets.max_depth = max_depth;
        }
        if let Some(level) = file.logging.level {
            self.log_level = level;
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(root) = var("CHANCELLOR_ASSET_ROOT") {
            self.assets.root = PathBuf::from(root);
        }
        if let Some(level) = var("CHANCELLOR_LOG") {
            self.log_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chancellor_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chancellor.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let config_str = r#"
[assets]
root = "game/assets"
skip_hidden = true
max_depth = 4

[logging]
level = "debug"
"#;
        let path = temp_config(config_str);
        let mut config = ChancellorConfig::default();
        config.apply_file(ChancellorConfig::load_file(&path).unwrap());

        assert_eq!(config.assets.root, PathBuf::from("game/assets"));
        assert!(config.assets.skip_hidden);
        assert_eq!(config.assets.max_depth, 4);
        assert_eq!(config.log_level, "debug");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let config = ChancellorConfig::from_toml_str("[assets]\nskip_hidden = true\n").unwrap();
        assert_eq!(config.assets.root, PathBuf::from("assets"));
        assert_eq!(config.assets.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.assets.skip_hidden);
        assert_eq!(config.log_level, "info");

        let empty = ChancellorConfig::from_toml_str("").unwrap();
        assert_eq!(empty, ChancellorConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ChancellorConfig::from_toml_str("[assets]\nroot = \"from_file\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("CHANCELLOR_ASSET_ROOT", "from_env"),
            ("CHANCELLOR_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.assets.root, PathBuf::from("from_env"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = temp_config("[assets\nroot = 1");
        let err = ChancellorConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, ChancellorError::ConfigError(_)));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_walk_options_from_settings() {
        let settings = AssetSettings {
            root: PathBuf::from("assets"),
            skip_hidden: true,
            max_depth: 2,
        };
        assert_eq!(
            settings.walk_options(),
            WalkOptions {
                skip_hidden: true,
                max_depth: 2
            }
        );
    }
}
