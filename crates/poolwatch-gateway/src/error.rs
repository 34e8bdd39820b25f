// ── Gateway error taxonomy ──
//
// Connection and Protocol are connectivity failures: the session is
// assumed broken and the caller may tear it down and reconnect.
// IncompleteData means the session is fine but the payload could not be
// fully interpreted — reconnecting would not help.

use thiserror::Error;

/// Errors surfaced by a [`Gateway`](crate::Gateway) implementation.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Cannot establish gateway session: {reason}")]
    Connection { reason: String },

    #[error("Protocol error mid-session: {message}")]
    Protocol { message: String },

    #[error("Incomplete data from gateway: {message}")]
    IncompleteData { message: String },
}

impl GatewayError {
    /// True for failures that indicate a broken session rather than a
    /// decode/consistency problem.
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            GatewayError::Connection { .. } | GatewayError::Protocol { .. }
        )
    }
}

/// Errors from the broadcast discovery scan.
///
/// Non-fatal to polling: the connection-info resolver degrades to the
/// statically configured address when a scan fails.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Discovery socket error: {0}")]
    Io(#[from] std::io::Error),
}
