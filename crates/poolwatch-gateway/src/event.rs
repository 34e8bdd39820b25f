// ── Push notification event bus ──
//
// Gateways that hold a live session receive unsolicited change messages
// from the device. The bus fans them out on per-code broadcast channels;
// dropping the receiver is the unsubscription, so a consumer's teardown
// always releases its slot regardless of exit path.

use tokio::sync::broadcast;

const EVENT_CHANNEL_SIZE: usize = 64;

/// Push message classes delivered outside the poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCode {
    StatusChanged,
    ChemistryChanged,
}

impl EventCode {
    /// Wire message code for this event class.
    pub const fn code(self) -> u16 {
        match self {
            EventCode::StatusChanged => 12500,
            EventCode::ChemistryChanged => 12505,
        }
    }

    pub const fn from_code(code: u16) -> Option<EventCode> {
        match code {
            12500 => Some(EventCode::StatusChanged),
            12505 => Some(EventCode::ChemistryChanged),
            _ => None,
        }
    }
}

/// A push notification. Carries no payload — consumers re-read the
/// current data snapshot from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayEvent {
    pub code: EventCode,
}

/// Typed event bus with one broadcast channel per event class.
#[derive(Debug)]
pub struct EventBus {
    status: broadcast::Sender<GatewayEvent>,
    chemistry: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (status, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (chemistry, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self { status, chemistry }
    }

    /// Subscribe to one event class. Dropping the receiver unsubscribes.
    pub fn subscribe(&self, code: EventCode) -> broadcast::Receiver<GatewayEvent> {
        self.sender(code).subscribe()
    }

    /// Publish an event to current subscribers. Lagging or absent
    /// receivers are not an error.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.sender(event.code).send(event);
    }

    fn sender(&self, code: EventCode) -> &broadcast::Sender<GatewayEvent> {
        match code {
            EventCode::StatusChanged => &self.status,
            EventCode::ChemistryChanged => &self.chemistry,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
