//! Guard configuration.
//!
//! Looked up in order: an explicit path, `./sqlwarden.toml`, then
//! `<config dir>/sqlwarden/config.toml`; defaults when none exists.
//! `SQLWARDEN_ENABLED` overrides `enabled` afterwards.
//!
//! ```toml
//! enabled = true
//! verbose = false
//! dialect = "mysql"
//!
//! [policy]
//! warnings_as_errors = false
//! escalate = ["INJECTION_SUSPECTED"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WardenError, WardenResult};
use crate::finding::{Finding, FindingCode, Severity};
use crate::scanner::Dialect;

pub const FILE_NAME: &str = "sqlwarden.toml";
pub const ENABLED_VAR: &str = "SQLWARDEN_ENABLED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// When false every validation is bypassed.
    pub enabled: bool,
    /// Build a suggestion for the primary finding.
    pub verbose: bool,
    pub dialect: Dialect,
    pub policy: Policy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verbose: false,
            dialect: Dialect::default(),
            policy: Policy::default(),
        }
    }
}

/// Which warnings make a report fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub warnings_as_errors: bool,
    /// Warning codes treated as blocking.
    pub escalate: Vec<FindingCode>,
}

impl Policy {
    /// Whether `finding` sets the report status to error.
    pub fn blocks(&self, finding: &Finding) -> bool {
        match finding.severity {
            Severity::Error => true,
            Severity::Warning => self.warnings_as_errors || self.escalate.contains(&finding.code),
            Severity::Info => false,
        }
    }
}

impl GuardConfig {
    pub fn new(enabled: bool, verbose: bool) -> Self {
        Self {
            enabled,
            verbose,
            ..Self::default()
        }
    }

    /// Load from `explicit`, else the first existing default location.
    pub fn load(explicit: Option<&Path>) -> WardenResult<Self> {
        let found = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| p.is_file()),
        };

        let mut config = match found {
            Some(path) => {
                let config = Self::from_path(&path)?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                config
            }
            None => Self::default(),
        };

        if let Ok(raw) = std::env::var(ENABLED_VAR) {
            match parse_flag(&raw) {
                Some(enabled) => config.enabled = enabled,
                None => tracing::warn!(value = %raw, "ignoring unrecognised {}", ENABLED_VAR),
            }
        }
        Ok(config)
    }

    /// Default locations, most specific first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlwarden").join("config.toml"));
        }
        paths
    }

    pub fn from_path(path: &Path) -> WardenResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| WardenError::config(path, e.to_string()))?;
        toml::from_str(&content).map_err(|e| WardenError::config(path, e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> WardenResult<Self> {
        toml::from_str(content).map_err(|e| WardenError::config("<inline>", e.to_string()))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
