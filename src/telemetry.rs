//! Telemetry wire format: topics, the combined state document, and the
//! retained publications produced for each announcement.
//!
//! The broker sees two views of the same data:
//!
//! - one scalar per topic (`…/fuellstand`, `…/distanz`, `…/auffuellungen`,
//!   `…/firmware`) for simple consumers, and
//! - the combined [`StateDocument`] as JSON on the base topic.
//!
//! Every publication is retained so a late subscriber sees the last state.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::monitor::{Distance, FillLevel};

pub const TOPIC_BASE: &str = "rocket/wasserstand";
pub const TOPIC_LEVEL: &str = "rocket/wasserstand/fuellstand";
pub const TOPIC_DISTANCE: &str = "rocket/wasserstand/distanz";
pub const TOPIC_STATUS: &str = "rocket/wasserstand/status";
pub const TOPIC_REFILLS: &str = "rocket/wasserstand/auffuellungen";
pub const TOPIC_COMMAND: &str = "rocket/wasserstand/command";
pub const TOPIC_FIRMWARE: &str = "rocket/wasserstand/firmware";

pub const STATUS_ONLINE: &str = "online";
pub const STATUS_OFFLINE: &str = "offline";

/// Retained payload that overwrites a processed command.
pub const COMMAND_CLEARED: &str = " ";

/// Combined state object.  Fields stay absent until first known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuellstand: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distanz: Option<Distance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auffuellungen: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
}

impl StateDocument {
    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|_| TransportError::PublishFailed)
    }
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: &'static str,
    pub payload: String,
    pub retain: bool,
}

impl Publication {
    fn retained(topic: &'static str, payload: impl Into<String>) -> Self {
        Self {
            topic,
            payload: payload.into(),
            retain: true,
        }
    }
}

/// Level rounded to one decimal, as shown on the wire.
pub fn round_level(level: FillLevel) -> f32 {
    (level * 10.0).round() / 10.0
}

/// Keeps the state document current and turns announcements into
/// [`Publication`] batches.
#[derive(Debug, Default)]
pub struct TelemetryState {
    doc: StateDocument,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &StateDocument {
        &self.doc
    }

    /// Scalars for level and distance, then the updated document.
    pub fn fill_level(
        &mut self,
        level: FillLevel,
        distance_mm: Distance,
    ) -> Result<Vec<Publication>, TransportError> {
        let level = round_level(level);
        self.doc.fuellstand = Some(level);
        self.doc.distanz = Some(distance_mm);
        Ok(vec![
            Publication::retained(TOPIC_LEVEL, format!("{level:.1}")),
            Publication::retained(TOPIC_DISTANCE, distance_mm.to_string()),
            Publication::retained(TOPIC_BASE, self.doc.to_json()?),
        ])
    }

    /// Scalar refill count, then the updated document.
    pub fn refill_count(&mut self, count: u32) -> Result<Vec<Publication>, TransportError> {
        self.doc.auffuellungen = Some(count);
        Ok(vec![
            Publication::retained(TOPIC_REFILLS, count.to_string()),
            Publication::retained(TOPIC_BASE, self.doc.to_json()?),
        ])
    }

    /// Availability and firmware version after a (re)connect.
    pub fn announce(&mut self, firmware: &str) -> Result<Vec<Publication>, TransportError> {
        self.doc.firmware = Some(firmware.to_owned());
        Ok(vec![
            Publication::retained(TOPIC_STATUS, STATUS_ONLINE),
            Publication::retained(TOPIC_FIRMWARE, firmware),
            Publication::retained(TOPIC_BASE, self.doc.to_json()?),
        ])
    }

    pub fn clear_command(&self) -> Publication {
        Publication::retained(TOPIC_COMMAND, COMMAND_CLEARED)
    }
}
