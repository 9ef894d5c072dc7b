//! Weather Feed Core Library
//!
//! Shared utilities for the collector and server crates:
//! - Configuration loading (XDG-compliant)
//! - Common defaults

mod config;

pub use config::{find_config_file, get_xdg_config_path, load_config, ConfigSource};

/// Application name used for XDG paths
pub const APP_NAME: &str = "weather-feed";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Locations requested from the forecast API per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Pause between forecast pages, keeps the upstream API from being flooded
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1000;

/// Daily refresh at 06:00 server local time
pub const DEFAULT_SCHEDULE: &str = "0 6 * * *";

pub const DEFAULT_FORECAST_URL: &str =
    "https://8ohij8472m.execute-api.eu-central-1.amazonaws.com/prod/forecast";

pub const DEFAULT_LOCATIONS_FILE: &str = "./filtered_ililce.json";
