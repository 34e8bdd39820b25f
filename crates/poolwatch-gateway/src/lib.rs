//! Gateway contract, data model, and network discovery for poolwatch.
//!
//! This crate owns everything a consumer needs to talk *about* a
//! pool-controller gateway without owning the binary protocol itself:
//!
//! - **[`Gateway`]** — Async session contract: connect/disconnect, the
//!   four category fetches, snapshot access, and push-event
//!   subscription. Protocol libraries implement it; `poolwatch-core`
//!   drives it.
//!
//! - **[`GatewayData`]** — Decoded telemetry as a category-keyed map of
//!   tagged payloads ([`CategoryData::Flat`] / [`CategoryData::Indexed`]),
//!   shared between one writer and many readers via pointer-swapped
//!   snapshots ([`SharedGatewayData`]).
//!
//! - **[`EventBus`]** — Typed push-notification fan-out
//!   ([`EventCode::StatusChanged`], [`EventCode::ChemistryChanged`]);
//!   dropping a receiver is the unsubscription.
//!
//! - **[`BroadcastDiscovery`]** — Bounded-time UDP broadcast scan
//!   answering "which gateways are on this network right now", behind
//!   the [`Rediscover`] seam.

pub mod data;
pub mod discovery;
pub mod error;
pub mod event;
pub mod gateway;

pub use data::{
    CategoryData, DataCategory, EQUIPMENT_FLAGS_FIELD, EquipmentFlags, FieldMap, GatewayData,
    SharedGatewayData,
};
pub use discovery::{
    BroadcastDiscovery, DEFAULT_DISCOVERY_TIMEOUT, DISCOVERY_PORT, DiscoveredGateway, Rediscover,
};
pub use error::{DiscoveryError, GatewayError};
pub use event::{EventBus, EventCode, GatewayEvent};
pub use gateway::{ConnectInfo, Gateway};
