// SPDX-License-Identifier: MIT OR Apache-2.0
//! Client configuration: identity declared during the handshake plus the
//! two timing knobs of the connection state machine.
//!
//! Embedders usually bake a [`ClientConfig`] into the page bundle; the TOML
//! loader exists for host shells that configure surfaces from files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The ready-gate buffer timeout is unusually large; tool-opened
    /// surfaces may sit in a spinner state that long.
    LargeReadyBuffer {
        /// Timeout value in milliseconds.
        ms: u64,
    },
    /// The log-level override is not a recognized tracing level.
    UnknownLogLevel {
        /// The value as configured.
        value: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::LargeReadyBuffer { ms } => {
                write!(f, "ready buffer timeout is large ({ms}ms)")
            }
            ConfigWarning::UnknownLogLevel { value } => {
                write!(f, "unknown log level '{value}'")
            }
        }
    }
}

/// Default ready-gate buffer timeout, in milliseconds.
pub const DEFAULT_READY_BUFFER_MS: u64 = 500;

/// Default handshake timeout, in milliseconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// Settings for one [`crate::SurfaceClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Surface name declared in the `initialize` handshake.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Surface version declared in the `initialize` handshake.
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Upper bound on the `initialize` round-trip.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_ms: u64,

    /// How long a tool-opened surface waits for its first pushed event
    /// before declaring itself ready anyway.
    #[serde(default = "default_ready_buffer")]
    pub ready_buffer_timeout_ms: u64,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_client_name() -> String {
    "surface".into()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_handshake_timeout() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_MS
}

fn default_ready_buffer() -> u64 {
    DEFAULT_READY_BUFFER_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            client_version: default_client_version(),
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            ready_buffer_timeout_ms: DEFAULT_READY_BUFFER_MS,
            log_level: None,
        }
    }
}

impl ClientConfig {
    /// A config with the given surface identity and default timings.
    #[must_use]
    pub fn named(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client_name: name.into(),
            client_version: version.into(),
            ..Self::default()
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    /// Load and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check hard constraints; returns advisory warnings on success.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut reasons = Vec::new();
        if self.client_name.is_empty() {
            reasons.push("client_name must not be empty".to_string());
        }
        if self.handshake_timeout_ms == 0 {
            reasons.push("handshake_timeout_ms must be nonzero".to_string());
        }
        if !reasons.is_empty() {
            return Err(ConfigError::ValidationError { reasons });
        }

        let mut warnings = Vec::new();
        if self.ready_buffer_timeout_ms > 5_000 {
            warnings.push(ConfigWarning::LargeReadyBuffer {
                ms: self.ready_buffer_timeout_ms,
            });
        }
        if let Some(level) = &self.log_level {
            let known = ["trace", "debug", "info", "warn", "error"];
            if !known.contains(&level.as_str()) {
                warnings.push(ConfigWarning::UnknownLogLevel {
                    value: level.clone(),
                });
            }
        }
        Ok(warnings)
    }

    pub(crate) fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub(crate) fn ready_buffer_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_buffer_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate_clean() {
        let config = ClientConfig::default();
        assert_eq!(config.ready_buffer_timeout_ms, 500);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ClientConfig::from_toml_str(
            "client_name = \"kanban\"\nready_buffer_timeout_ms = 250\n",
        )
        .unwrap();
        assert_eq!(config.client_name, "kanban");
        assert_eq!(config.ready_buffer_timeout_ms, 250);
        assert_eq!(config.handshake_timeout_ms, DEFAULT_HANDSHAKE_TIMEOUT_MS);
    }

    #[test]
    fn zero_handshake_timeout_is_a_hard_error() {
        let config = ClientConfig {
            handshake_timeout_ms: 0,
            ..ClientConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn large_ready_buffer_warns() {
        let config = ClientConfig {
            ready_buffer_timeout_ms: 60_000,
            ..ClientConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(
            warnings,
            vec![ConfigWarning::LargeReadyBuffer { ms: 60_000 }]
        );
    }

    #[test]
    fn unknown_log_level_warns() {
        let config = ClientConfig {
            log_level: Some("loud".into()),
            ..ClientConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::UnknownLogLevel { .. })));
    }

    #[test]
    fn load_reads_a_file_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client_name = \"from-disk\"").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.client_name, "from-disk");

        let err = ClientConfig::load("/nonexistent/surface.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = ClientConfig::from_toml_str("client_name = [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
