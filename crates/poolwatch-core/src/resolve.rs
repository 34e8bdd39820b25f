// ── Connection info resolution ──
//
// Each (re)connection attempt rediscovers the gateway on the network
// first, so DHCP address changes are picked up. A failed or empty scan
// degrades to the statically configured address — this path never
// fails, and it never retries; retry policy belongs to the caller.

use poolwatch_gateway::{ConnectInfo, Rediscover};
use tracing::{debug, warn};

use crate::config::DeviceConfig;

/// Human-readable gateway name derived from a short device id.
pub fn name_for_device(device_id: &str) -> String {
    format!("Pentair: {device_id}")
}

/// Resolve fresh connect info for one connection attempt.
pub async fn resolve_connect_info(
    config: &DeviceConfig,
    discovery: &dyn Rediscover,
) -> ConnectInfo {
    match discovery.scan().await {
        Ok(mut discovered) => {
            if let Some(info) = discovered.remove(&config.device_id) {
                debug!(device_id = %config.device_id, gateway = %info, "gateway rediscovered");
                return info;
            }
            warn!(
                device_id = %config.device_id,
                "gateway rediscovery found no match; using static connect info"
            );
        }
        Err(error) => {
            warn!(error = %error, "gateway rediscovery failed; using static connect info");
        }
    }
    config.static_connect_info()
}
