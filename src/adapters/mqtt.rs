//! MQTT telemetry adapter.
//!
//! Implements [`TelemetryPort`] on top of the ESP-IDF MQTT client.
//!
//! ## Threading
//!
//! The client delivers its events on its own task.  The event callback
//! never touches core state: it converts each event into a [`LinkEvent`]
//! and pushes it into [`channels::LINK_EVENTS`](crate::channels::LINK_EVENTS).
//! The control loop drains that channel, lets this adapter observe each
//! event ([`MqttAdapter::observe_link`]) and then hands it to the
//! application service.
//!
//! ## Session lifecycle
//!
//! - Reconnects are driven by the client itself at a fixed interval
//!   (`reconnect_interval_ms`).
//! - The broker publishes `offline` on the status topic when the session
//!   dies (last will); `announce` publishes `online`.
//! - While no session is up every publish fails fast with
//!   [`TransportError::Unavailable`].
//! - Publications are queued into the client's outbox and never block
//!   the control loop.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real `EspMqttClient`.
//! - **all other targets**: an in-memory outbox for host-side tests.

use log::{debug, warn};

use crate::app::events::LinkEvent;
use crate::app::ports::TelemetryPort;
use crate::error::TransportError;
use crate::monitor::{Distance, FillLevel};
use crate::telemetry::{Publication, TOPIC_COMMAND, TelemetryState};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Broker connection parameters.
#[derive(Debug, Clone)]
pub struct MqttSettings<'a> {
    pub url: &'a str,
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub reconnect_interval_ms: u32,
}

pub struct MqttAdapter {
    telemetry: TelemetryState,
    connected: bool,
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    outbox: Vec<Publication>,
    #[cfg(not(target_os = "espidf"))]
    subscriptions: Vec<&'static str>,
    #[cfg(not(target_os = "espidf"))]
    fail_publish: bool,
}

impl MqttAdapter {
    /// Create the client and start connecting in the background.
    #[cfg(target_os = "espidf")]
    pub fn connect(settings: &MqttSettings<'_>) -> Result<Self, EspError> {
        use core::time::Duration;

        use crate::channels::push_link_event;
        use crate::telemetry::{STATUS_OFFLINE, TOPIC_STATUS};

        let conf = MqttClientConfiguration {
            client_id: Some(settings.client_id),
            username: settings.username,
            password: settings.password,
            keep_alive_interval: Some(Duration::from_secs(15)),
            reconnect_timeout: Some(Duration::from_millis(u64::from(
                settings.reconnect_interval_ms,
            ))),
            lwt: Some(LwtConfiguration {
                topic: TOPIC_STATUS,
                payload: STATUS_OFFLINE.as_bytes(),
                qos: QoS::AtLeastOnce,
                retain: true,
            }),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(settings.url, &conf, move |event| {
            let link = match event.payload() {
                EventPayload::Connected(_) => Some(LinkEvent::Connected),
                EventPayload::Disconnected => Some(LinkEvent::Disconnected),
                EventPayload::Received { topic, data, .. } => {
                    LinkEvent::message(topic.unwrap_or(""), data)
                }
                _ => None,
            };
            if let Some(link) = link {
                if !push_link_event(link) {
                    warn!("MQTT | link queue full, event dropped");
                }
            }
        })?;

        log::info!(
            "MQTT | client started (url={}, reconnect={}ms)",
            settings.url, settings.reconnect_interval_ms
        );
        Ok(Self {
            telemetry: TelemetryState::new(),
            connected: false,
            client,
        })
    }

    /// Offline adapter with an in-memory outbox.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated() -> Self {
        Self {
            telemetry: TelemetryState::new(),
            connected: false,
            outbox: Vec::new(),
            subscriptions: Vec::new(),
            fail_publish: false,
        }
    }

    /// Track session state and (re)subscribe after a connect.  Called by
    /// the control loop for every drained [`LinkEvent`] before dispatch.
    pub fn observe_link(&mut self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected => {
                self.connected = true;
                self.subscribe_commands();
            }
            LinkEvent::Disconnected => self.connected = false,
            LinkEvent::Message { .. } => {}
        }
    }

    pub fn telemetry(&self) -> &TelemetryState {
        &self.telemetry
    }

    fn send_all(&mut self, batch: Vec<Publication>) -> Result<(), TransportError> {
        for publication in &batch {
            self.send(publication)?;
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::Unavailable)
        }
    }

    #[cfg(target_os = "espidf")]
    fn subscribe_commands(&mut self) {
        match self.client.subscribe(TOPIC_COMMAND, QoS::AtLeastOnce) {
            Ok(_) => log::info!("MQTT | subscribed to {}", TOPIC_COMMAND),
            Err(e) => warn!("MQTT | subscribe failed: {}", e),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe_commands(&mut self) {
        if !self.subscriptions.contains(&TOPIC_COMMAND) {
            self.subscriptions.push(TOPIC_COMMAND);
        }
    }

    #[cfg(target_os = "espidf")]
    fn send(&mut self, p: &Publication) -> Result<(), TransportError> {
        self.client
            .enqueue(p.topic, QoS::AtLeastOnce, p.retain, p.payload.as_bytes())
            .map(|_| debug!("MQTT | {} <- {}", p.topic, p.payload))
            .map_err(|e| {
                warn!("MQTT | enqueue to {} failed: {}", p.topic, e);
                TransportError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn send(&mut self, p: &Publication) -> Result<(), TransportError> {
        if self.fail_publish {
            warn!("MQTT | enqueue to {} failed (simulated)", p.topic);
            return Err(TransportError::PublishFailed);
        }
        debug!("MQTT | {} <- {}", p.topic, p.payload);
        self.outbox.push(p.clone());
        Ok(())
    }

    // ── Simulation helpers ────────────────────────────────────

    /// Everything published since the last call.
    #[cfg(not(target_os = "espidf"))]
    pub fn take_outbox(&mut self) -> Vec<Publication> {
        core::mem::take(&mut self.outbox)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscriptions(&self) -> &[&'static str] {
        &self.subscriptions
    }

    /// Make every publish fail with `PublishFailed`.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_failing(&mut self, fail: bool) {
        self.fail_publish = fail;
    }
}

impl TelemetryPort for MqttAdapter {
    fn is_available(&self) -> bool {
        self.connected
    }

    fn publish_fill_level(
        &mut self,
        level: FillLevel,
        distance_mm: Distance,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let batch = self.telemetry.fill_level(level, distance_mm)?;
        self.send_all(batch)
    }

    fn publish_refill_count(&mut self, count: u32) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let batch = self.telemetry.refill_count(count)?;
        self.send_all(batch)
    }

    fn announce(&mut self, firmware: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let batch = self.telemetry.announce(firmware)?;
        self.send_all(batch)
    }

    fn clear_command(&mut self) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let cleared = self.telemetry.clear_command();
        self.send(&cleared)
    }
}
