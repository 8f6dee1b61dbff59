//! Optional TOML settings file
//!
//! Values here sit between built-in defaults and command-line flags.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming a settings file
pub const CONFIG_ENV: &str = "KUBELIST_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Where a settings file may come from
#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingsPath {
    /// Named explicitly on the command line or in the environment; must exist
    Required(PathBuf),
    /// The per-user default; skipped when absent
    Optional(PathBuf),
}

impl Settings {
    /// Load settings from `--config`, else `$KUBELIST_CONFIG`, else
    /// `~/.config/kubelist/config.toml`. No file means default settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV);
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::load_from(discover(explicit, from_env, home.as_deref()))
    }

    fn load_from(path: Option<SettingsPath>) -> Result<Self> {
        let path = match path {
            None => return Ok(Self::default()),
            Some(SettingsPath::Optional(path)) if !path.exists() => return Ok(Self::default()),
            Some(SettingsPath::Required(path) | SettingsPath::Optional(path)) => path,
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

fn discover(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    home: Option<&Path>,
) -> Option<SettingsPath> {
    if let Some(path) = explicit {
        return Some(SettingsPath::Required(path.to_path_buf()));
    }

    if let Some(path) = from_env
        && !path.is_empty()
    {
        return Some(SettingsPath::Required(PathBuf::from(path)));
    }

    home.map(|home| SettingsPath::Optional(home.join(".config/kubelist/config.toml")))
}
