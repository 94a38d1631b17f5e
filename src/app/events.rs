//! Application events, in both directions.
//!
//! - [`AppEvent`] is emitted by the [`AppService`](super::service::AppService)
//!   through the [`EventSink`](super::ports::EventSink) port.
//! - [`InboundEvent`] is what the outside world feeds into
//!   [`AppService::dispatch`](super::service::AppService::dispatch): transport
//!   lifecycle and firmware-update progress, delivered as plain values
//!   instead of registered callbacks.

use heapless::{String, Vec};

use crate::error::{CommandError, SensorError};
use crate::app::ports::StorageError;
use crate::monitor::{Distance, FillLevel};

/// Longest topic a [`LinkEvent::Message`] can carry.
pub const MAX_TOPIC_LEN: usize = 64;
/// Longest payload a [`LinkEvent::Message`] can carry.
pub const MAX_PAYLOAD_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the hydrated refill count).
    Started { refills: u32 },

    /// A fill level was announced to the broker.
    Telemetry(TelemetryData),

    /// A refill was detected and counted.
    RefillDetected { count: u32, delta: f32 },

    /// The refill counter was zeroed by command.
    RefillCounterReset,

    /// The persisted refill count was adopted.
    CounterHydrated(u32),

    /// A sample was skipped.
    SensorFault(SensorError),

    /// A durable write or read failed; the in-memory value is kept.
    PersistenceFailed(StorageError),

    /// A command payload was ignored.
    CommandIgnored(CommandError),

    /// Broker session came up.
    LinkUp,

    /// Broker session dropped.
    LinkDown,
}

/// The announced reading plus the counter value at that moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub level: FillLevel,
    pub distance_mm: Distance,
    pub refills: u32,
}

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// Transport session lifecycle, as observed by the MQTT client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    Message {
        topic: String<MAX_TOPIC_LEN>,
        payload: Vec<u8, MAX_PAYLOAD_LEN>,
    },
}

impl LinkEvent {
    /// Copy a received message into owned fixed-capacity buffers.
    /// Returns `None` if either part does not fit.
    pub fn message(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = String::new();
        t.push_str(topic).ok()?;
        let p = Vec::from_slice(payload).ok()?;
        Some(Self::Message { topic: t, payload: p })
    }
}

/// Firmware-update lifecycle, as reported by the update transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Started,
    Progress { done: u32, total: u32 },
    Finished,
    Failed,
}

/// Everything [`AppService::dispatch`](super::service::AppService::dispatch) consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Link(LinkEvent),
    Update(UpdateEvent),
}

impl From<LinkEvent> for InboundEvent {
    fn from(e: LinkEvent) -> Self {
        Self::Link(e)
    }
}

impl From<UpdateEvent> for InboundEvent {
    fn from(e: UpdateEvent) -> Self {
        Self::Update(e)
    }
}
