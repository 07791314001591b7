//! Domain-level error taxonomy for NightCheck.

use std::path::PathBuf;

/// Errors raised while loading configuration or classifying scripts.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("unknown interpreter family: {0}")]
    UnknownFamily(String),

    #[error("family {family} is configured more than once")]
    DuplicateFamily { family: String },

    #[error("invalid declaration pattern for {family}: {source}")]
    InvalidPattern {
        family: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for NightCheck domain operations.
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_display() {
        let err = CheckError::UnknownFamily("ruby".to_string());
        assert!(err.to_string().contains("unknown interpreter family"));

        let err = CheckError::DuplicateFamily {
            family: "perl".to_string(),
        };
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_read_error_names_path() {
        let err = CheckError::Read {
            path: PathBuf::from("/opt/scripts/missing.py"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/opt/scripts/missing.py"));
        assert!(msg.contains("gone"));
    }
}
