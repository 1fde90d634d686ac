//! tempo core library
//!
//! Shared utilities for the forecast assistant:
//! - Configuration file discovery (XDG-compliant)
//! - TOML configuration loading
//! - Common defaults

mod config;

pub use config::{find_config_file, get_xdg_config_path, load_config, ConfigSource};

/// Application name used for XDG paths
pub const APP_NAME: &str = "tempo";

/// Public AEMET site serving the municipality XML feeds
pub const DEFAULT_AEMET_BASE_URL: &str = "https://www.aemet.es";

/// Local time at which daily reports go out
pub const DEFAULT_REPORT_TIME: &str = "08:00";

/// Timezone the daily report time is interpreted in
pub const DEFAULT_TIMEZONE: &str = "Europe/Madrid";

/// Seconds before an AEMET request is abandoned
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 20;
