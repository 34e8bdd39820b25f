// ── Gateway session contract ──
//
// The wire protocol and payload decoding live behind this trait. Each
// fetch refreshes part of the gateway's held data; `data()` returns the
// last successfully decoded snapshot without touching the network.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::data::GatewayData;
use crate::error::GatewayError;
use crate::event::{EventCode, GatewayEvent};

/// Where and how to reach a gateway for one connection attempt.
///
/// Derived fresh each time a (re)connection is attempted — never
/// persisted beyond the attempt, so DHCP address changes are picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectInfo {
    /// Advertised gateway name (e.g. `"Pentair: 01-02-03"`).
    pub name: String,
    pub addr: IpAddr,
    pub port: u16,
}

impl std::fmt::Display for ConnectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.addr, self.port)
    }
}

/// A stateful session with a pool-controller gateway.
///
/// Implementations own the socket, the binary protocol, and the decoded
/// [`GatewayData`]; consumers only drive the session lifecycle and read
/// snapshots. All fetch calls refresh the held data in place of a return
/// payload.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Establish a session. Must populate at least the CONFIG category
    /// before returning.
    async fn connect(&self, info: &ConnectInfo) -> Result<(), GatewayError>;

    /// Tear down the current session. Held data is retained.
    async fn disconnect(&self);

    /// Refresh controller status (sensors, circuit state).
    async fn fetch_status(&self) -> Result<(), GatewayError>;

    /// Refresh chemistry-controller data.
    async fn fetch_chemistry(&self) -> Result<(), GatewayError>;

    /// Refresh per-pump data.
    async fn fetch_pumps(&self) -> Result<(), GatewayError>;

    /// Refresh salt-chlorine-generator data.
    async fn fetch_scg(&self) -> Result<(), GatewayError>;

    /// Last successfully decoded snapshot. Never blocks.
    fn data(&self) -> Arc<GatewayData>;

    /// True if this session passively receives push updates and should
    /// not issue its own status queries.
    fn is_listener_only(&self) -> bool {
        false
    }

    /// Subscribe to push notifications for one event class. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self, code: EventCode) -> broadcast::Receiver<GatewayEvent>;
}
