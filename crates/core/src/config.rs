//! Config file discovery and loading.
//!
//! Values are layered, strongest first: command line flags, `TEMPO_*`
//! environment variables, the config file, then built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use serde::de::DeserializeOwned;

use crate::APP_NAME;

/// Where the config file in effect was found.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// `--config` flag or the config env var
    Explicit(PathBuf),
    CurrentDir(PathBuf),
    /// `$XDG_CONFIG_HOME/tempo/` or `~/.config/tempo/`
    XdgConfig(PathBuf),
    /// `/etc/tempo/`
    System(PathBuf),
    /// No file, built-in defaults only
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::CurrentDir(p)
            | ConfigSource::XdgConfig(p)
            | ConfigSource::System(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }

    /// Resolve a path named inside the config file.
    ///
    /// Relative paths are taken relative to the directory holding the config
    /// file; with no config file they stay relative to the working directory.
    pub fn resolve_relative(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            return candidate;
        }
        match self.path().and_then(|p| p.parent()) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(candidate),
            _ => candidate,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Locate `filename`, checking `env_var`, the working directory, the XDG
/// config home and `/etc/tempo/` in that order.
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    let from_env = env::var(env_var).ok().map(PathBuf::from);
    if let Some(path) = from_env.filter(|p| p.exists()) {
        return ConfigSource::Explicit(path);
    }

    let candidates: [(PathBuf, fn(PathBuf) -> ConfigSource); 3] = [
        (PathBuf::from(filename), ConfigSource::CurrentDir),
        (get_xdg_config_path(filename), ConfigSource::XdgConfig),
        (
            Path::new("/etc").join(APP_NAME).join(filename),
            ConfigSource::System,
        ),
    ];
    candidates
        .into_iter()
        .find(|(path, _)| path.exists())
        .map(|(path, source)| source(path))
        .unwrap_or(ConfigSource::Defaults)
}

/// `$XDG_CONFIG_HOME/tempo/<filename>`, falling back to `~/.config`.
pub fn get_xdg_config_path(filename: &str) -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join(APP_NAME).join(filename)
}

/// Parse the TOML file behind `source`, or `T::default()` when there is none.
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> anyhow::Result<T> {
    match source.path() {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: T = toml::from_str(&content)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Ok(config)
        }
        None => Ok(T::default()),
    }
}
