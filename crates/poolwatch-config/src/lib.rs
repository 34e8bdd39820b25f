//! Tool-owned settings: TOML file + environment merge, and translation
//! to `poolwatch_core::DeviceConfig`.
//!
//! Core never sees these types — it receives a pre-built `DeviceConfig`.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use poolwatch_core::DeviceConfig;

/// Environment variables override the file, e.g.
/// `POOLWATCH_DEVICE__ADDRESS=192.168.1.10`.
pub const ENV_PREFIX: &str = "POOLWATCH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot load settings: {0}")]
    Load(#[from] Box<figment::Error>),
}

// ── TOML settings structs ────────────────────────────────────────────

/// Tool-owned settings file layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub device: DeviceSettings,
}

/// The `[device]` table: one monitored gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Short device id, the last three MAC octets (`"XX-XX-XX"`).
    pub device_id: String,

    /// Static gateway address, the fallback when rediscovery fails.
    pub address: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between scheduled polls. Values below the core floor are
    /// clamped up during translation.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Milliseconds to wait for discovery scan responses.
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
}

fn default_port() -> u16 {
    80
}
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_discovery_timeout_ms() -> u64 {
    1000
}

impl DeviceSettings {
    /// Translate to the core runtime config, enforcing the poll
    /// interval floor.
    pub fn into_device_config(self) -> DeviceConfig {
        let mut config = DeviceConfig::new(self.device_id, self.address)
            .with_port(self.port)
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs));
        config.discovery_timeout = Duration::from_millis(self.discovery_timeout_ms);
        config
    }
}

// ── Loading ──────────────────────────────────────────────────────────

/// Load settings from a TOML file merged with `POOLWATCH_*` environment
/// variables (environment wins).
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let settings = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)?;
    Ok(settings)
}

/// Default settings file location (`~/.config/poolwatch/poolwatch.toml`
/// on Linux, platform-appropriate elsewhere).
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "poolwatch")
        .map_or_else(
            || PathBuf::from("poolwatch.toml"),
            |dirs| dirs.config_dir().join("poolwatch.toml"),
        )
}
