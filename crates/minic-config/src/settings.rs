//! Configuration file schema
//!
//! The same schema is used for the project file (`minic.toml`) and the global
//! file (`~/.minic/config.toml`). Every field is optional so files can be
//! layered; effective values are resolved in [`crate::Config`].

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of one configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct MinicConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quickfix: Option<QuickFixConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// `[diagnostics]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Append explanation and suggestion to messages (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich: Option<bool>,

    /// `source` field of published diagnostics (default: "minic")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Maximum diagnostics published per document (default: 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_problems: Option<usize>,

    /// Report unused locals (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unused_variable_warnings: Option<bool>,
}

/// `[quickfix]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct QuickFixConfig {
    /// Offer a generic fix when no resolver produced anything (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_fallback: Option<bool>,

    /// Offer extract actions for single-line selections (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_actions: Option<bool>,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error (default: warn)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl MinicConfig {
    /// Load a configuration file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(diagnostics) = &self.diagnostics {
            if diagnostics.max_problems == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "diagnostics.max_problems".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            if diagnostics.source.as_deref().is_some_and(|s| s.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "diagnostics.source".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validate_log_level("logging.level", level)?;
        }

        Ok(())
    }

    /// Merge another config into this one, field by field.
    /// Values set in `other` take precedence.
    pub fn merge(&mut self, other: &MinicConfig) {
        if let Some(theirs) = &other.diagnostics {
            let ours = self.diagnostics.get_or_insert_with(Default::default);
            overlay(&mut ours.enrich, &theirs.enrich);
            overlay(&mut ours.source, &theirs.source);
            overlay(&mut ours.max_problems, &theirs.max_problems);
            overlay(&mut ours.unused_variable_warnings, &theirs.unused_variable_warnings);
        }
        if let Some(theirs) = &other.quickfix {
            let ours = self.quickfix.get_or_insert_with(Default::default);
            overlay(&mut ours.generic_fallback, &theirs.generic_fallback);
            overlay(&mut ours.extract_actions, &theirs.extract_actions);
        }
        if let Some(theirs) = &other.logging {
            let ours = self.logging.get_or_insert_with(Default::default);
            overlay(&mut ours.level, &theirs.level);
        }
    }
}

fn overlay<T: Clone>(ours: &mut Option<T>, theirs: &Option<T>) {
    if theirs.is_some() {
        ours.clone_from(theirs);
    }
}

/// Validate a tracing level name
pub(crate) fn validate_log_level(field: &str, value: &str) -> ConfigResult<()> {
    if !matches!(
        value.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be one of trace, debug, info, warn, error, got '{}'",
                value
            ),
        });
    }
    Ok(())
}
