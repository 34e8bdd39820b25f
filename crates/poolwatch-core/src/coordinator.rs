// ── Update/reconnect coordinator ──
//
// One coordinator per monitored gateway owns the poll schedule. Each
// cycle re-reads equipment flags from the held snapshot, issues the
// configured fetch set, and on a connectivity failure tears the session
// down, rediscovers the gateway, reconnects, and replays the fetch set
// exactly once. All consumers share the one poll result; nobody
// re-fetches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use poolwatch_gateway::{EquipmentFlags, Gateway, GatewayData, GatewayError, Rediscover};

use crate::config::DeviceConfig;
use crate::error::{PollResult, UpdateError};
use crate::resolve::resolve_connect_info;

const OUTCOME_CHANNEL_SIZE: usize = 64;

/// Debounce window for deferred poll requests. Consumers request a
/// deferred poll after observing a push notification to capture
/// secondary effects of a state change; the window coalesces bursts
/// into one cycle.
pub const DEFERRED_POLL_COOLDOWN: Duration = Duration::from_secs(10);

// ── ConnectionState ──────────────────────────────────────────────

/// Coordinator state observable by consumers.
///
/// `Reconnecting` is transient: entered when a connectivity failure
/// triggers the in-cycle reconnect, left as soon as a fresh session is
/// established. A failed reconnect leaves the state as `Reconnecting`
/// until a later cycle succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Reconnecting,
}

/// Broadcast to subscribers after every poll completion, success or
/// failure. Carries no data — consumers read the current snapshot from
/// the gateway.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub result: PollResult,
}

impl PollOutcome {
    pub const fn success(&self) -> bool {
        self.result.is_ok()
    }
}

// ── UpdateCoordinator ────────────────────────────────────────────

/// Shared poll loop for one gateway.
///
/// Cheaply cloneable via `Arc`. The caller establishes the first
/// connection before the coordinator's first tick; the coordinator only
/// reconnects.
#[derive(Clone)]
pub struct UpdateCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: DeviceConfig,
    gateway: Arc<dyn Gateway>,
    discovery: Arc<dyn Rediscover>,
    state: watch::Sender<ConnectionState>,
    last_update_success: watch::Sender<bool>,
    last_successful_poll: watch::Sender<Option<DateTime<Utc>>>,
    outcome_tx: broadcast::Sender<PollOutcome>,
    /// Serializes poll cycles: a second on-demand poll arriving mid-cycle
    /// waits instead of racing the snapshot replacement.
    poll_lock: Mutex<()>,
    deferred: Notify,
}

impl UpdateCoordinator {
    pub fn new(
        config: DeviceConfig,
        gateway: Arc<dyn Gateway>,
        discovery: Arc<dyn Rediscover>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connected);
        let (last_update_success, _) = watch::channel(false);
        let (last_successful_poll, _) = watch::channel(None);
        let (outcome_tx, _) = broadcast::channel(OUTCOME_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                gateway,
                discovery,
                state,
                last_update_success,
                last_successful_poll,
                outcome_tx,
                poll_lock: Mutex::new(()),
                deferred: Notify::new(),
            }),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    /// Current data snapshot from the gateway.
    pub fn data(&self) -> Arc<GatewayData> {
        self.inner.gateway.data()
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Whether the most recent poll cycle succeeded. `false` until the
    /// first successful cycle.
    pub fn last_update_success(&self) -> watch::Receiver<bool> {
        self.inner.last_update_success.subscribe()
    }

    pub fn last_successful_poll(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.last_successful_poll.subscribe()
    }

    /// Subscribe to poll completions. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<PollOutcome> {
        self.inner.outcome_tx.subscribe()
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one poll cycle now.
    ///
    /// Cycles are strictly serialized; concurrent callers queue on the
    /// poll lock. Every completion is recorded and broadcast. Held data
    /// is never dropped on failure — stale values stay visible until a
    /// later cycle overwrites them.
    pub async fn poll_once(&self) -> PollResult {
        let _guard = self.inner.poll_lock.lock().await;
        let result = self.update_cycle().await;
        self.record_outcome(&result);
        result
    }

    /// Run an immediate on-demand poll.
    ///
    /// Subscribers observe the outcome through the broadcast channel;
    /// callers that need the result use [`poll_once`](Self::poll_once).
    pub async fn trigger_poll(&self) {
        if let Err(e) = self.poll_once().await {
            warn!(error = %e, "on-demand poll failed");
        }
    }

    /// Request a debounced follow-up poll.
    ///
    /// Returns immediately; the run loop wakes, waits out
    /// [`DEFERRED_POLL_COOLDOWN`], and polls once. Requests arriving in
    /// the window are coalesced.
    pub fn request_deferred_poll(&self) {
        self.inner.deferred.notify_one();
    }

    /// Drive the poll schedule until cancelled.
    ///
    /// Scheduled ticks and deferred requests both funnel through
    /// [`poll_once`](Self::poll_once); failures are logged here because
    /// subscribers already receive the typed outcome.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.inner.config.poll_interval);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "scheduled poll failed");
                    }
                }
                () = self.inner.deferred.notified() => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(DEFERRED_POLL_COOLDOWN) => {}
                    }
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "deferred poll failed");
                    }
                }
            }
        }
    }

    // ── Cycle internals ──────────────────────────────────────────

    async fn update_cycle(&self) -> PollResult {
        match self.fetch_configured().await {
            Ok(()) => Ok(()),
            Err(error) if error.is_connectivity() => {
                warn!(error = %error, "update error - attempting reconnect");
                self.reconnect_and_retry().await
            }
            // Session is fine but data is inconsistent; reconnecting
            // would not help.
            Err(error) => Err(UpdateError::Incomplete { source: error }),
        }
    }

    /// Issue the fetch set for the currently installed equipment.
    ///
    /// Flags come from the gateway's held snapshot, re-read fresh every
    /// attempt — equipment can change between cycles, and a reconnect
    /// repopulates the CONFIG category before the replay.
    async fn fetch_configured(&self) -> Result<(), GatewayError> {
        let gateway = self.inner.gateway.as_ref();
        let flags = gateway.data().equipment_flags().ok_or_else(|| {
            GatewayError::IncompleteData {
                message: "held gateway data has no equipment configuration".to_owned(),
            }
        })?;
        debug!(flags = flags.bits(), "issuing configured fetch set");

        if !gateway.is_listener_only() {
            gateway.fetch_status().await?;
            if flags.contains(EquipmentFlags::INTELLICHEM) {
                gateway.fetch_chemistry().await?;
            }
        }
        gateway.fetch_pumps().await?;
        if flags.contains(EquipmentFlags::CHLORINATOR) {
            gateway.fetch_scg().await?;
        }
        Ok(())
    }

    /// Tear down the session, resolve fresh connect info, reconnect, and
    /// replay the fetch set once. No further retry within this cycle —
    /// the scheduler interval is the outer backoff.
    async fn reconnect_and_retry(&self) -> PollResult {
        let _ = self.inner.state.send(ConnectionState::Reconnecting);
        let gateway = self.inner.gateway.as_ref();

        gateway.disconnect().await;

        let connect_info =
            resolve_connect_info(&self.inner.config, self.inner.discovery.as_ref()).await;
        if let Err(error) = gateway.connect(&connect_info).await {
            return Err(UpdateError::Reconnect { source: error });
        }
        let _ = self.inner.state.send(ConnectionState::Connected);
        info!(gateway = %connect_info, "reconnected to gateway");

        self.fetch_configured().await.map_err(|error| {
            if error.is_connectivity() {
                UpdateError::Update { source: error }
            } else {
                UpdateError::Incomplete { source: error }
            }
        })
    }

    fn record_outcome(&self, result: &PollResult) {
        let _ = self.inner.last_update_success.send(result.is_ok());
        if result.is_ok() {
            let _ = self.inner.last_successful_poll.send(Some(Utc::now()));
        }
        let _ = self.inner.outcome_tx.send(PollOutcome {
            result: result.clone(),
        });
    }
}
