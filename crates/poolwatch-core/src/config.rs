// ── Per-device runtime configuration ──
//
// Built by the host (CLI, config loader), passed to the coordinator.
// Core never reads config files.

use std::net::IpAddr;
use std::time::Duration;

use poolwatch_gateway::{ConnectInfo, DEFAULT_DISCOVERY_TIMEOUT};

use crate::resolve::name_for_device;

/// Default interval between scheduled polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Enforced floor for the poll interval. The scheduler interval is the
/// outer backoff for failed cycles, so it must not be driven to zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for monitoring a single gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Short device id, the last three MAC octets (`"XX-XX-XX"`).
    pub device_id: String,
    /// Statically configured address, used when rediscovery fails.
    pub addr: IpAddr,
    pub port: u16,
    /// Interval between scheduled polls (floor-clamped).
    pub poll_interval: Duration,
    /// Deadline for one rediscovery scan during reconnect.
    pub discovery_timeout: Duration,
}

impl DeviceConfig {
    pub fn new(device_id: impl Into<String>, addr: IpAddr) -> Self {
        Self {
            device_id: device_id.into(),
            addr,
            port: 80,
            poll_interval: DEFAULT_POLL_INTERVAL,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the poll interval, clamped to [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Fallback connect info built from static configuration.
    pub fn static_connect_info(&self) -> ConnectInfo {
        ConnectInfo {
            name: name_for_device(&self.device_id),
            addr: self.addr,
            port: self.port,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn poll_interval_is_floor_clamped() {
        let config = DeviceConfig::new("01-02-03", IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_poll_interval(Duration::from_secs(3));
        assert_eq!(config.poll_interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn static_connect_info_uses_derived_name() {
        let config = DeviceConfig::new("01-02-03", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
            .with_port(8080);
        let info = config.static_connect_info();
        assert_eq!(info.name, "Pentair: 01-02-03");
        assert_eq!(info.port, 8080);
    }
}
