//! Error types for Chancellor

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Chancellor operations
#[derive(Debug, Error)]
pub enum ChancellorError {
    #[error("Asset root not found or not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Asset error: {0}")]
    AssetError(String),
}

/// Result type alias for Chancellor operations
pub type Result<T> = std::result::Result<T, ChancellorError>;

impl From<toml::de::Error> for ChancellorError {
    fn from(err: toml::de::Error) -> Self {
        ChancellorError::TomlParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_message() {
        let err = ChancellorError::RootNotFound(PathBuf::from("missing/assets"));
        assert!(err.to_string().contains("missing/assets"));
    }

    #[test]
    fn test_io_error_conversion() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(ChancellorError::IoError(_))));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("root = ");
        let err: ChancellorError = parsed.unwrap_err().into();
        assert!(matches!(err, ChancellorError::TomlParseError(_)));
    }
}
