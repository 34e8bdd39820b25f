// Integration tests for `UpdateCoordinator` using a scripted fake
// gateway that records every call and injects per-call failures.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use poolwatch_core::{
    ConnectionState, DEFERRED_POLL_COOLDOWN, DeviceConfig, UpdateCoordinator, UpdateError,
};
use poolwatch_gateway::{
    CategoryData, ConnectInfo, DataCategory, DiscoveryError, EQUIPMENT_FLAGS_FIELD, EquipmentFlags,
    EventBus, EventCode, FieldMap, Gateway, GatewayData, GatewayError, GatewayEvent, Rediscover,
    SharedGatewayData,
};

// ── Fakes ───────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeGateway {
    shared: SharedGatewayData,
    calls: StdMutex<Vec<String>>,
    failures: StdMutex<HashMap<&'static str, VecDeque<GatewayError>>>,
    listener_only: bool,
    events: EventBus,
}

impl FakeGateway {
    fn with_data(data: GatewayData) -> Self {
        let fake = Self::default();
        fake.shared.replace(data);
        fake
    }

    fn listener_only(mut self) -> Self {
        self.listener_only = true;
        self
    }

    /// Queue an error for the next invocation of `op`.
    fn fail_next(&self, op: &'static str, error: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    fn set_data(&self, data: GatewayData) {
        self.shared.replace(data);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(op.to_owned());
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn connect(&self, info: &ConnectInfo) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("connect:{}", info.addr));
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut("connect")
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) {
        self.calls.lock().unwrap().push("disconnect".to_owned());
    }

    async fn fetch_status(&self) -> Result<(), GatewayError> {
        self.record("status")
    }

    async fn fetch_chemistry(&self) -> Result<(), GatewayError> {
        self.record("chemistry")
    }

    async fn fetch_pumps(&self) -> Result<(), GatewayError> {
        self.record("pumps")
    }

    async fn fetch_scg(&self) -> Result<(), GatewayError> {
        self.record("scg")
    }

    fn data(&self) -> Arc<GatewayData> {
        self.shared.load()
    }

    fn is_listener_only(&self) -> bool {
        self.listener_only
    }

    fn subscribe(&self, code: EventCode) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe(code)
    }
}

enum ScanScript {
    Found(IpAddr),
    NoMatch,
    Fails,
}

struct FakeDiscovery {
    script: ScanScript,
    scans: StdMutex<usize>,
}

impl FakeDiscovery {
    fn new(script: ScanScript) -> Self {
        Self {
            script,
            scans: StdMutex::new(0),
        }
    }

    fn scan_count(&self) -> usize {
        *self.scans.lock().unwrap()
    }
}

#[async_trait]
impl Rediscover for FakeDiscovery {
    async fn scan(&self) -> Result<HashMap<String, ConnectInfo>, DiscoveryError> {
        *self.scans.lock().unwrap() += 1;
        match self.script {
            ScanScript::Found(addr) => Ok(HashMap::from([(
                DEVICE_ID.to_owned(),
                ConnectInfo {
                    name: format!("Pentair: {DEVICE_ID}"),
                    addr,
                    port: 80,
                },
            )])),
            ScanScript::NoMatch => Ok(HashMap::new()),
            ScanScript::Fails => Err(DiscoveryError::Io(std::io::Error::from(
                std::io::ErrorKind::NetworkUnreachable,
            ))),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

const DEVICE_ID: &str = "01-02-03";
const STATIC_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));
const FRESH_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 77));

fn data_with_flags(flags: EquipmentFlags) -> GatewayData {
    let mut config = FieldMap::new();
    config.insert(EQUIPMENT_FLAGS_FIELD.to_owned(), json!(flags.bits()));
    let mut data = GatewayData::new();
    data.insert(DataCategory::Config, CategoryData::Flat(config));
    data
}

fn protocol_error() -> GatewayError {
    GatewayError::Protocol {
        message: "unexpected message code".to_owned(),
    }
}

fn incomplete_error() -> GatewayError {
    GatewayError::IncompleteData {
        message: "short chemistry payload".to_owned(),
    }
}

fn coordinator(
    gateway: Arc<FakeGateway>,
    discovery: Arc<FakeDiscovery>,
) -> UpdateCoordinator {
    let config = DeviceConfig::new(DEVICE_ID, STATIC_ADDR);
    UpdateCoordinator::new(config, gateway, discovery)
}

// ── Fetch-set selection ─────────────────────────────────────────────

#[tokio::test]
async fn no_optional_equipment_polls_status_and_pumps_only() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    coordinator.poll_once().await.unwrap();

    assert_eq!(gateway.calls(), ["status", "pumps"]);
}

#[tokio::test]
async fn full_equipment_polls_all_categories_in_order() {
    let flags = EquipmentFlags::INTELLICHEM | EquipmentFlags::CHLORINATOR;
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(flags)));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    coordinator.poll_once().await.unwrap();

    assert_eq!(gateway.calls(), ["status", "chemistry", "pumps", "scg"]);
}

#[tokio::test]
async fn listener_only_client_skips_status_and_chemistry() {
    let flags = EquipmentFlags::INTELLICHEM | EquipmentFlags::CHLORINATOR;
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(flags)).listener_only());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    coordinator.poll_once().await.unwrap();

    assert_eq!(gateway.calls(), ["pumps", "scg"]);
}

#[tokio::test]
async fn equipment_flags_are_reread_each_cycle() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::CHLORINATOR,
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    coordinator.poll_once().await.unwrap();
    assert_eq!(gateway.calls(), ["status", "pumps", "scg"]);

    // Chlorinator removed between cycles.
    gateway.set_data(data_with_flags(EquipmentFlags::default()));
    coordinator.poll_once().await.unwrap();
    assert_eq!(
        gateway.calls(),
        ["status", "pumps", "scg", "status", "pumps"]
    );
}

#[tokio::test]
async fn missing_equipment_config_fails_without_fetching() {
    let gateway = Arc::new(FakeGateway::with_data(GatewayData::new()));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    let error = coordinator.poll_once().await.unwrap_err();

    assert!(matches!(error, UpdateError::Incomplete { .. }));
    assert!(gateway.calls().is_empty());
}

// ── Reconnect-and-retry ─────────────────────────────────────────────

#[tokio::test]
async fn protocol_error_triggers_one_reconnect_and_full_replay() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::CHLORINATOR,
    )));
    gateway.fail_next("pumps", protocol_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::Found(FRESH_ADDR)));
    let coordinator = coordinator(Arc::clone(&gateway), Arc::clone(&discovery));

    coordinator.poll_once().await.unwrap();

    // First attempt breaks at pumps, then one disconnect + rediscover +
    // reconnect to the fresh address + full replay.
    assert_eq!(
        gateway.calls(),
        [
            "status".to_owned(),
            "pumps".to_owned(),
            "disconnect".to_owned(),
            format!("connect:{FRESH_ADDR}"),
            "status".to_owned(),
            "pumps".to_owned(),
            "scg".to_owned(),
        ]
    );
    assert_eq!(discovery.scan_count(), 1);
}

#[tokio::test]
async fn second_failure_in_replay_ends_cycle_without_third_attempt() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    gateway.fail_next("status", protocol_error());
    gateway.fail_next("status", protocol_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), Arc::clone(&discovery));

    let error = coordinator.poll_once().await.unwrap_err();

    assert!(matches!(error, UpdateError::Update { .. }));
    assert_eq!(
        gateway.calls(),
        [
            "status".to_owned(),
            "disconnect".to_owned(),
            format!("connect:{STATIC_ADDR}"),
            "status".to_owned(),
        ]
    );
    // Exactly one reconnect sequence — no third attempt this cycle.
    assert_eq!(discovery.scan_count(), 1);
}

#[tokio::test]
async fn incomplete_data_never_triggers_reconnect() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    gateway.fail_next("pumps", incomplete_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), Arc::clone(&discovery));

    let error = coordinator.poll_once().await.unwrap_err();

    assert!(matches!(error, UpdateError::Incomplete { .. }));
    assert_eq!(gateway.calls(), ["status", "pumps"]);
    assert_eq!(discovery.scan_count(), 0);
}

#[tokio::test]
async fn failed_reconnect_ends_cycle_in_reconnecting_state() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    gateway.fail_next("status", protocol_error());
    gateway.fail_next(
        "connect",
        GatewayError::Connection {
            reason: "connection refused".to_owned(),
        },
    );
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    let error = coordinator.poll_once().await.unwrap_err();

    assert!(matches!(error, UpdateError::Reconnect { .. }));
    assert_eq!(
        *coordinator.connection_state().borrow(),
        ConnectionState::Reconnecting
    );
    // No replay after the failed connect.
    assert_eq!(
        gateway.calls(),
        [
            "status".to_owned(),
            "disconnect".to_owned(),
            format!("connect:{STATIC_ADDR}"),
        ]
    );
}

#[tokio::test]
async fn successful_reconnect_restores_connected_state() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    gateway.fail_next("status", protocol_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::Fails));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    let mut state = coordinator.connection_state();
    coordinator.poll_once().await.unwrap();

    // The transient Reconnecting state was published, and Connected is
    // current again. Discovery failure degraded to the static address.
    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow(), ConnectionState::Connected);
    assert!(
        gateway
            .calls()
            .contains(&format!("connect:{STATIC_ADDR}"))
    );
}

// ── Outcome fan-out ─────────────────────────────────────────────────

#[tokio::test]
async fn every_completion_is_broadcast_to_subscribers() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);
    let mut outcomes = coordinator.subscribe();

    coordinator.poll_once().await.unwrap();
    assert!(outcomes.recv().await.unwrap().success());

    gateway.fail_next("pumps", incomplete_error());
    let _ = coordinator.poll_once().await;
    assert!(!outcomes.recv().await.unwrap().success());
}

#[tokio::test]
async fn trigger_poll_reports_only_through_subscription() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    gateway.fail_next("pumps", incomplete_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);
    let mut outcomes = coordinator.subscribe();

    coordinator.trigger_poll().await;

    let outcome = outcomes.recv().await.unwrap();
    assert!(!outcome.success());
    assert!(matches!(
        outcome.result,
        Err(UpdateError::Incomplete { .. })
    ));
}

#[tokio::test]
async fn last_update_success_tracks_most_recent_cycle() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    assert!(!*coordinator.last_update_success().borrow());
    assert!(coordinator.last_successful_poll().borrow().is_none());

    coordinator.poll_once().await.unwrap();
    assert!(*coordinator.last_update_success().borrow());
    assert!(coordinator.last_successful_poll().borrow().is_some());

    gateway.fail_next("pumps", incomplete_error());
    let _ = coordinator.poll_once().await;
    assert!(!*coordinator.last_update_success().borrow());
    // Timestamp of the last success is retained.
    assert!(coordinator.last_successful_poll().borrow().is_some());
}

#[tokio::test]
async fn stale_data_is_preserved_across_failed_cycles() {
    let data = data_with_flags(EquipmentFlags::default());
    let gateway = Arc::new(FakeGateway::with_data(data.clone()));
    gateway.fail_next("pumps", incomplete_error());
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let coordinator = coordinator(Arc::clone(&gateway), discovery);

    let _ = coordinator.poll_once().await;

    assert_eq!(*coordinator.data(), data);
}

// ── Scheduling ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn deferred_poll_waits_out_the_cooldown() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let config = DeviceConfig::new(DEVICE_ID, STATIC_ADDR)
        .with_poll_interval(Duration::from_secs(3600));
    let coordinator = UpdateCoordinator::new(config, gateway.clone(), discovery);

    let cancel = CancellationToken::new();
    let runner = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(cancel).await })
    };
    let mut outcomes = coordinator.subscribe();
    tokio::task::yield_now().await;

    let before = tokio::time::Instant::now();
    coordinator.request_deferred_poll();
    let outcome = outcomes.recv().await.unwrap();

    assert!(outcome.success());
    assert!(before.elapsed() >= DEFERRED_POLL_COOLDOWN);
    assert_eq!(gateway.calls(), ["status", "pumps"]);

    cancel.cancel();
    runner.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduled_polls_fire_on_the_configured_interval() {
    let gateway = Arc::new(FakeGateway::with_data(data_with_flags(
        EquipmentFlags::default(),
    )));
    let discovery = Arc::new(FakeDiscovery::new(ScanScript::NoMatch));
    let config =
        DeviceConfig::new(DEVICE_ID, STATIC_ADDR).with_poll_interval(Duration::from_secs(30));
    let coordinator = UpdateCoordinator::new(config, gateway.clone(), discovery);

    let cancel = CancellationToken::new();
    let runner = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(cancel).await })
    };
    let mut outcomes = coordinator.subscribe();

    // Two scheduled cycles.
    assert!(outcomes.recv().await.unwrap().success());
    assert!(outcomes.recv().await.unwrap().success());
    assert_eq!(gateway.calls(), ["status", "pumps", "status", "pumps"]);

    cancel.cancel();
    runner.await.unwrap();
}
