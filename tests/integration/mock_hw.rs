//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full history
//! without touching a real sensor, LED ring, broker or flash partition.

use std::collections::{HashMap, VecDeque};

use tanklevel::app::events::AppEvent;
use tanklevel::app::ports::{
    CounterStore, EventSink, IndicatorPort, SensorPort, StorageError, TelemetryPort,
};
use tanklevel::error::{SensorError, TransportError};
use tanklevel::indicator::Directive;
use tanklevel::monitor::Distance;

// ── MockHardware ──────────────────────────────────────────────

/// Replays a queue of sensor results; an empty queue reads as `NotReady`.
pub struct MockHardware {
    pub samples: VecDeque<Result<Distance, SensorError>>,
    pub shown: Vec<Directive>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
            shown: Vec::new(),
        }
    }

    pub fn with_distances(distances: &[Distance]) -> Self {
        let mut hw = Self::new();
        hw.samples.extend(distances.iter().map(|d| Ok(*d)));
        hw
    }

    pub fn push(&mut self, sample: Result<Distance, SensorError>) {
        self.samples.push_back(sample);
    }

    pub fn last_shown(&self) -> Option<Directive> {
        self.shown.last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_distance(&mut self, _now_ms: u64) -> Result<Distance, SensorError> {
        self.samples.pop_front().unwrap_or(Err(SensorError::NotReady))
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, directive: Directive) {
        self.shown.push(directive);
    }
}

// ── MockBroker ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    FillLevel { level: f32, distance_mm: Distance },
    RefillCount(u32),
    Announce(String),
    ClearCommand,
}

/// Records every accepted publish.  `available == false` refuses with
/// `Unavailable`; `fail == true` refuses with `PublishFailed`.
pub struct MockBroker {
    pub available: bool,
    pub fail: bool,
    pub calls: Vec<BrokerCall>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn online() -> Self {
        Self {
            available: true,
            fail: false,
            calls: Vec::new(),
        }
    }

    pub fn offline() -> Self {
        Self {
            available: false,
            ..Self::online()
        }
    }

    pub fn levels(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::FillLevel { level, .. } => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn counts(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BrokerCall::RefillCount(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn accept(&mut self, call: BrokerCall) -> Result<(), TransportError> {
        if !self.available {
            return Err(TransportError::Unavailable);
        }
        if self.fail {
            return Err(TransportError::PublishFailed);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl TelemetryPort for MockBroker {
    fn is_available(&self) -> bool {
        self.available
    }

    fn publish_fill_level(
        &mut self,
        level: f32,
        distance_mm: Distance,
    ) -> Result<(), TransportError> {
        self.accept(BrokerCall::FillLevel { level, distance_mm })
    }

    fn publish_refill_count(&mut self, count: u32) -> Result<(), TransportError> {
        self.accept(BrokerCall::RefillCount(count))
    }

    fn announce(&mut self, firmware: &str) -> Result<(), TransportError> {
        self.accept(BrokerCall::Announce(firmware.to_owned()))
    }

    fn clear_command(&mut self) -> Result<(), TransportError> {
        self.accept(BrokerCall::ClearCommand)
    }
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub values: HashMap<String, u32>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub writes: Vec<(String, u32)>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with(key: &str, value: u32) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_owned(), value);
        store
    }
}

impl CounterStore for MockStore {
    fn get_u32(&self, key: &str, default: u32) -> Result<u32, StorageError> {
        if self.fail_reads {
            return Err(StorageError::IoError);
        }
        Ok(self.values.get(key).copied().unwrap_or(default))
    }

    fn put_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.values.insert(key.to_owned(), value);
        self.writes.push((key.to_owned(), value));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refills_detected(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::RefillDetected { .. }))
            .count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
