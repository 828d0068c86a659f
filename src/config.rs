//! Run configuration.
//!
//! Settings come from an optional JSON file; command-line flags override
//! whatever the file sets.
//!
//! ```json
//! { "max_steps": 1000000, "trace": false, "trailing_bytes": "pad" }
//! ```

use crate::asm::image::TrailingBytes;
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Settings for one run of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Stop after this many instructions. `None` runs until the program halts.
    pub max_steps: Option<u64>,
    /// Log every executed instruction.
    pub trace: bool,
    /// Handling of images whose length is not a multiple of four bytes.
    pub trailing_bytes: TrailingBytes,
}

impl RunConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_steps, None);
        assert!(!config.trace);
        assert_eq!(config.trailing_bytes, TrailingBytes::Reject);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RunConfig::from_json(r#"{ "trailing_bytes": "pad" }"#).unwrap();
        assert_eq!(config.trailing_bytes, TrailingBytes::Pad);
        assert_eq!(config.max_steps, None);
    }

    #[test]
    fn test_full_json() {
        let config = RunConfig::from_json(
            r#"{ "max_steps": 500, "trace": true, "trailing_bytes": "reject" }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            RunConfig { max_steps: Some(500), trace: true, trailing_bytes: TrailingBytes::Reject }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            RunConfig::from_json(r#"{ "max_cycles": 5 }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
