//! Index run configuration.
//!
//! `IndexConfig` is read from a TOML file (every key optional) and then
//! overridden field-by-field from the command line via `IndexConfigOverride`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Configuration version written to `ZDOCSET.ZCONFIGURATIONVERSION`.
pub const DEFAULT_CONFIGURATION_VERSION: &str = "1.0";

/// Apply `Option`-field overrides from a source struct to a target struct.
///
/// For each field name, if `$src.field` is `Some(v)`, sets `$dst.field = v`.
macro_rules! apply_option_overrides {
    ($src:expr, $dst:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(ref v) = $src.$field {
                $dst.$field = v.clone();
            }
        )+
    };
}

/// Which top-level TOC node becomes the docset root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RootPolicy {
    /// First top-level node wins.
    #[default]
    First,
    /// Last top-level node wins (the historical docsetutil-clone behaviour).
    Last,
    /// Exactly one top-level node is required.
    Single,
}

impl RootPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootPolicy::First => "first",
            RootPolicy::Last => "last",
            RootPolicy::Single => "single",
        }
    }
}

impl fmt::Display for RootPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_configuration_version() -> String {
    DEFAULT_CONFIGURATION_VERSION.to_string()
}

/// Settings for one index run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Restrict to one localization. Accepted but not applied.
    #[serde(default)]
    pub localization: Option<String>,
    /// Restrict to documents at or below a `:`-separated node path. Accepted but not applied.
    #[serde(default)]
    pub node: Option<String>,
    /// Skip the full-text index. Accepted but not applied.
    #[serde(default)]
    pub skip_text: bool,
    /// Skip the API index. Accepted but not applied.
    #[serde(default)]
    pub skip_api: bool,
    #[serde(default = "default_configuration_version")]
    pub configuration_version: String,
    #[serde(default)]
    pub root_policy: RootPolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            localization: None,
            node: None,
            skip_text: false,
            skip_api: false,
            configuration_version: default_configuration_version(),
            root_policy: RootPolicy::default(),
        }
    }
}

/// Per-invocation overrides; `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default)]
pub struct IndexConfigOverride {
    pub localization: Option<Option<String>>,
    pub node: Option<Option<String>>,
    pub skip_text: Option<bool>,
    pub skip_api: Option<bool>,
    pub configuration_version: Option<String>,
    pub root_policy: Option<RootPolicy>,
}

impl IndexConfig {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: format!("Failed to parse config: {}", e),
        })
    }

    pub fn apply_overrides(&mut self, overrides: &IndexConfigOverride) {
        apply_option_overrides!(
            overrides,
            self,
            localization,
            node,
            skip_text,
            skip_api,
            configuration_version,
            root_policy,
        );
    }

    /// Names of the filter settings that are set but have no effect on the run.
    pub fn inert_filters(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.localization.is_some() {
            set.push("localization");
        }
        if self.node.is_some() {
            set.push("node");
        }
        if self.skip_text {
            set.push("skip-text");
        }
        if self.skip_api {
            set.push("skip-api");
        }
        set
    }
}
