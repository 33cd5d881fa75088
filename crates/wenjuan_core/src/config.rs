//! Core configuration.
//!
//! # Responsibility
//! - Describe where survey data lives and how category deletion behaves.
//! - Carry optional logging setup for the composition root.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Storage location for survey data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    /// Private in-memory database, discarded on close.
    #[default]
    Memory,
    /// SQLite database file, created when missing.
    File(PathBuf),
}

/// Behavior of category deletion while questionnaires still reference it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDeleteMode {
    /// Remove the category and detach it from every questionnaire.
    #[default]
    CascadeDetach,
    /// Refuse deletion with a conflict while any questionnaire uses it.
    Reject,
}

/// Logging setup forwarded to [`crate::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
}

/// Top-level configuration for [`crate::SurveyCore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseLocation,
    pub category_delete: CategoryDeleteMode,
    pub logging: Option<LoggingConfig>,
}

/// Configuration parse failure.
#[derive(Debug)]
pub struct ConfigError(serde_json::Error);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid core config: {}", self.0)
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl CoreConfig {
    /// Parses configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError)
    }
}

fn default_level() -> String {
    default_log_level().to_string()
}
