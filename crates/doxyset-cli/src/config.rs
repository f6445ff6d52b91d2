//! Locating and resolving the index configuration for one invocation.
//!
//! Precedence: command-line flags, then the config file (`--config` or
//! `$DOXYSET_CONFIG`), then built-in defaults.

use doxyset_core::{IndexConfig, IndexConfigOverride};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "DOXYSET_CONFIG";

/// Pick the config file: explicit flag first, then a non-empty environment value.
fn config_path(flag: Option<&Path>, env_value: Option<OsString>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

/// Load the config file (if any) and apply command-line overrides.
pub fn resolve_config(
    flag: Option<&Path>,
    overrides: &IndexConfigOverride,
) -> doxyset_core::Result<IndexConfig> {
    let path = config_path(flag, std::env::var_os(CONFIG_ENV));
    if let Some(ref p) = path {
        log::debug!("loading config from {}", p.display());
    }
    let mut config = IndexConfig::load(path.as_deref())?;
    config.apply_overrides(overrides);
    Ok(config)
}
