// ── Update failure taxonomy ──
//
// Every poll cycle ends in exactly one typed outcome. No fetch-path
// error escapes the coordinator raw: callers always see an UpdateError
// carrying the underlying cause, and held data is never dropped.

use poolwatch_gateway::GatewayError;
use thiserror::Error;

/// Why a poll cycle failed.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    /// A fetch failed on the post-reconnect replay. The first-attempt
    /// failure already consumed this cycle's single reconnect.
    #[error("Gateway update failed: {source}")]
    Update {
        #[source]
        source: GatewayError,
    },

    /// The session is fine but the data could not be fully interpreted.
    /// No reconnect is attempted for these.
    #[error("Incomplete gateway update: {source}")]
    Incomplete {
        #[source]
        source: GatewayError,
    },

    /// Re-establishing the session failed; the cycle ends without a
    /// replay. The next scheduled tick starts over.
    #[error("Gateway reconnect failed: {source}")]
    Reconnect {
        #[source]
        source: GatewayError,
    },
}

/// Result of one poll cycle.
pub type PollResult = Result<(), UpdateError>;
