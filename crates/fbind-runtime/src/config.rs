#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! With the `toml-config` feature (on by default), a [`BindConfig`] can be
//! loaded from TOML. Every field is optional and falls back to its default:
//!
//! ```toml
//! directive_prefix = "v-"
//! model_event = "input"
//! track_computed_reads = false
//! ```

use thiserror::Error;

/// Errors from loading or validating a [`BindConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Knobs for the binding compiler and view model.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "toml-config",
    derive(serde::Deserialize, serde::Serialize),
    serde(default, deny_unknown_fields)
)]
pub struct BindConfig {
    /// Attribute prefix marking a directive (`v-model`, `v-on:click`).
    pub directive_prefix: String,
    /// Event a `model` binding listens to for user input.
    pub model_event: String,
    /// Let computed getters attach the evaluating watcher to the properties
    /// they read. Off by default: computed properties own no registry and
    /// their reads are untracked.
    pub track_computed_reads: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            directive_prefix: "v-".to_owned(),
            model_event: "input".to_owned(),
            track_computed_reads: false,
        }
    }
}

impl BindConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directive_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "directive_prefix",
                reason: "must not be empty",
            });
        }
        if self.model_event.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model_event",
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    #[cfg(feature = "toml-config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
