//! Config file discovery and loading
//!
//! Values are layered, highest priority first: CLI arguments, environment
//! variables, the first config file found, built-in defaults. This module
//! only deals with the file layer.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::APP_NAME;

/// Where the config file layer came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Given on the command line or through the env var
    Explicit(PathBuf),
    /// `./<filename>`
    CurrentDir(PathBuf),
    /// `$XDG_CONFIG_HOME/weather-feed/<filename>`
    XdgConfig(PathBuf),
    /// `/etc/weather-feed/<filename>`
    System(PathBuf),
    /// Nothing found
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
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// First existing file among `$<env_var>`, `./<filename>`, the XDG config
/// dir and `/etc/weather-feed/`.
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    let candidates = [
        env::var_os(env_var).map(|path| ConfigSource::Explicit(PathBuf::from(path))),
        Some(ConfigSource::CurrentDir(PathBuf::from(filename))),
        Some(ConfigSource::XdgConfig(get_xdg_config_path(filename))),
        Some(ConfigSource::System(
            Path::new("/etc").join(APP_NAME).join(filename),
        )),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|source| source.path().is_some_and(|path| path.is_file()))
        .unwrap_or(ConfigSource::Defaults)
}

pub fn get_xdg_config_path(filename: &str) -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join(APP_NAME).join(filename)
}

/// Parses the TOML file behind `source`, or `T::default()` for
/// [`ConfigSource::Defaults`].
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> anyhow::Result<T> {
    let Some(path) = source.path() else {
        return Ok(T::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}
