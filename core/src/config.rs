//! # Runtime Configuration
//!
//! Defaults cover a page served from `http://localhost`. A TOML file can
//! override any field, and `TRELLIS_*` environment variables override the file:
//!
//! - `TRELLIS_LOCATION`: page location (its origin resolves root-relative asset urls)
//! - `TRELLIS_DEBUG`: `1|true|on` enables debug diagnostics
//! - `TRELLIS_ERROR_HEADER`: response header carrying the server's error message

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Localized number symbols used by the numeric-format translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberSymbols {
    pub grouping: char,
    pub decimal: char,
    pub minus: char,
}

impl Default for NumberSymbols {
    fn default() -> Self {
        Self {
            grouping: ',',
            decimal: '.',
            minus: '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub location: String,
    pub number_symbols: NumberSymbols,
    pub error_header: String,
    pub submit_field: String,
    pub zone_parameter: String,
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            location: "http://localhost/".to_string(),
            number_symbols: NumberSymbols::default(),
            error_header: "X-Trellis-ErrorMessage".to_string(),
            submit_field: "t:submit".to_string(),
            zone_parameter: "t:zoneid".to_string(),
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Apply `TRELLIS_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TRELLIS_*` overrides from an arbitrary lookup.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(location) = lookup("TRELLIS_LOCATION") {
            self.location = location;
        }
        if let Some(debug) = lookup("TRELLIS_DEBUG") {
            self.debug = matches!(
                debug.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
        if let Some(header) = lookup("TRELLIS_ERROR_HEADER") {
            self.error_header = header;
        }
        self
    }
}
