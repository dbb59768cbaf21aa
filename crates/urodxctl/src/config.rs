//! Config and catalog file loading.
//!
//! Config file priority:
//! 1. --config PATH
//! 2. $URODX_CONFIG
//! 3. ~/.config/urodx/config.toml
//! 4. /etc/urodx/config.toml
//! 5. Defaults

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use urodx_engine::{Catalog, EngineConfig};

pub const CONFIG_ENV: &str = "URODX_CONFIG";

/// ~/.config/urodx/config.toml, honoring XDG_CONFIG_HOME
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(Path::new(&xdg).join("urodx").join("config.toml"));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| Path::new(&home).join(".config").join("urodx").join("config.toml"))
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/urodx/config.toml")
}

pub fn load_config_file(path: &Path) -> Result<EngineConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    EngineConfig::from_toml_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the config, returning where it came from (`None` for defaults).
/// An explicit path must exist; discovered paths are skipped when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<(EngineConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config_file(path)?, Some(path.to_path_buf())));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            let path = PathBuf::from(env_path);
            let config = load_config_file(&path)
                .with_context(|| format!("${} points to an unusable file", CONFIG_ENV))?;
            return Ok((config, Some(path)));
        }
    }

    let candidates = user_config_path().into_iter().chain(std::iter::once(system_config_path()));
    for path in candidates {
        if path.exists() {
            return Ok((load_config_file(&path)?, Some(path)));
        }
    }

    Ok((EngineConfig::default(), None))
}

/// Built-in tables unless a catalog file is given
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog {}", path.display()))?;
            Catalog::from_toml_str(&contents)
                .with_context(|| format!("Invalid catalog {}", path.display()))
        }
        None => Catalog::urology().context("Built-in catalog failed validation"),
    }
}
