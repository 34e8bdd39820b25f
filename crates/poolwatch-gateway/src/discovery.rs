// ── UDP broadcast discovery ──
//
// Gateways answer a broadcast probe on port 1444 with their address,
// port, and advertised name. The scan is bounded-time: collect whatever
// answers arrive before the deadline, skip anything malformed.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::error::DiscoveryError;
use crate::gateway::ConnectInfo;

/// UDP port gateways listen on for discovery probes.
pub const DISCOVERY_PORT: u16 = 1444;

/// Default bounded scan duration.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(1);

/// 8-byte discovery probe; only the leading 1 is significant.
const PROBE: [u8; 8] = [1, 0, 0, 0, 0, 0, 0, 0];

/// Response check value identifying a gateway answer.
const RESPONSE_CHECK: u32 = 2;

/// One gateway found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredGateway {
    /// Short device id parsed from the advertised name
    /// (`"Pentair: 01-02-03"` → `"01-02-03"`).
    pub device_id: String,
    pub info: ConnectInfo,
    pub gateway_type: u8,
    pub gateway_subtype: u8,
}

/// A bounded-time network scan producing device id → connect info.
///
/// Seam for the connection-info resolver: production uses
/// [`BroadcastDiscovery`], tests substitute a scripted map.
#[async_trait]
pub trait Rediscover: Send + Sync {
    async fn scan(&self) -> Result<HashMap<String, ConnectInfo>, DiscoveryError>;
}

/// Concrete discovery over a broadcast UDP probe.
#[derive(Debug, Clone)]
pub struct BroadcastDiscovery {
    timeout: Duration,
}

impl BroadcastDiscovery {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one scan, returning every distinct gateway that answered
    /// before the deadline.
    pub async fn discover(&self) -> Result<Vec<DiscoveredGateway>, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;

        let target = SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT));
        socket.send_to(&PROBE, target).await?;
        debug!(%target, "discovery probe sent");

        let deadline = Instant::now() + self.timeout;
        let mut found: Vec<DiscoveredGateway> = Vec::new();
        let mut buf = [0u8; 256];

        loop {
            let Ok(received) = timeout_at(deadline, socket.recv_from(&mut buf)).await else {
                break; // deadline reached
            };
            let (len, peer) = received?;
            match parse_response(&buf[..len]) {
                Some(gateway) => {
                    debug!(%peer, gateway = %gateway.info, "discovery response");
                    if !found.iter().any(|g| g.device_id == gateway.device_id) {
                        found.push(gateway);
                    }
                }
                None => debug!(%peer, len, "skipping malformed discovery datagram"),
            }
        }

        Ok(found)
    }
}

impl Default for BroadcastDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_DISCOVERY_TIMEOUT)
    }
}

#[async_trait]
impl Rediscover for BroadcastDiscovery {
    async fn scan(&self) -> Result<HashMap<String, ConnectInfo>, DiscoveryError> {
        let found = self.discover().await?;
        Ok(found
            .into_iter()
            .map(|g| (g.device_id, g.info))
            .collect())
    }
}

/// Decode a discovery answer.
///
/// Layout: u32-LE check (must be 2), 4 IP octets, u16-LE port, gateway
/// type, gateway subtype, then the advertised name (NUL-padded).
fn parse_response(buf: &[u8]) -> Option<DiscoveredGateway> {
    if buf.len() < 12 {
        return None;
    }
    let check = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if check != RESPONSE_CHECK {
        return None;
    }

    let addr = IpAddr::V4(Ipv4Addr::new(buf[4], buf[5], buf[6], buf[7]));
    let port = u16::from_le_bytes([buf[8], buf[9]]);
    let name = String::from_utf8_lossy(&buf[12..])
        .trim_end_matches('\0')
        .to_owned();
    let device_id = short_id_from_name(&name)?;

    Some(DiscoveredGateway {
        device_id,
        info: ConnectInfo { name, addr, port },
        gateway_type: buf[10],
        gateway_subtype: buf[11],
    })
}

/// Extract the short device id from an advertised name.
///
/// Gateways advertise as `"Pentair: XX-XX-XX"` where the suffix is the
/// last three octets of the MAC.
fn short_id_from_name(name: &str) -> Option<String> {
    let (_, id) = name.rsplit_once(": ")?;
    if id.is_empty() {
        return None;
    }
    Some(id.to_owned())
}
