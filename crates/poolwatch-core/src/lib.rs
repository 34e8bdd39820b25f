//! Update/reconnect coordinator and diagnostic surface for poolwatch.
//!
//! This crate owns the polling logic between a [`Gateway`] protocol
//! implementation and host-platform consumers:
//!
//! - **[`UpdateCoordinator`]** — One shared poll loop per gateway.
//!   Decides which category fetches to issue from the equipment flags in
//!   the held snapshot, handles connectivity failures with a single
//!   in-cycle disconnect → rediscover → reconnect → replay, and
//!   broadcasts every [`PollOutcome`] so consumers read one result
//!   instead of re-fetching.
//!
//! - **[`resolve_connect_info`]** — Per-attempt connection info: live
//!   rediscovery first (follows DHCP address changes), static config as
//!   the degraded fallback. Never fails.
//!
//! - **[`DiagnosticSurface`]** — Derives the set of exposable diagnostic
//!   values from the shape of fetched data: per-category allow-lists
//!   plus every `unknown_at_offset_*` field the decoder reported, in a
//!   deterministic order, with two unconditional raw chemistry
//!   sentinels. Built once after the first successful poll.
//!
//! The gateway's wire protocol and decoding live behind the
//! [`Gateway`] trait in `poolwatch-gateway`; this crate never touches
//! sockets except through that boundary.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod resolve;
pub mod surface;

pub use config::{DEFAULT_POLL_INTERVAL, DeviceConfig, MIN_POLL_INTERVAL};
pub use coordinator::{
    ConnectionState, DEFERRED_POLL_COOLDOWN, PollOutcome, UpdateCoordinator,
};
pub use error::{PollResult, UpdateError};
pub use resolve::{name_for_device, resolve_connect_info};
pub use surface::{DiagnosticField, DiagnosticSurface, FieldKind, UNKNOWN_FIELD_PREFIX};

// Re-export the gateway contract consumers drive us with.
pub use poolwatch_gateway::{
    ConnectInfo, DataCategory, EquipmentFlags, Gateway, GatewayData, GatewayError, Rediscover,
};
