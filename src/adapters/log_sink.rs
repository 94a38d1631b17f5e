//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | level={:.1}% | distance={}mm | refills={}",
                    t.level, t.distance_mm, t.refills
                );
            }
            AppEvent::RefillDetected { count, delta } => {
                info!("REFILL | detected (+{:.1}%) | count={}", delta, count);
            }
            AppEvent::RefillCounterReset => {
                info!("REFILL | counter reset by command");
            }
            AppEvent::CounterHydrated(count) => {
                info!("REFILL | restored count={}", count);
            }
            AppEvent::SensorFault(e) => {
                warn!("SENSOR | sample skipped: {}", e);
            }
            AppEvent::PersistenceFailed(e) => {
                warn!("NVS | {} (keeping in-memory value)", e);
            }
            AppEvent::CommandIgnored(e) => {
                debug!("CMD | ignored: {}", e);
            }
            AppEvent::LinkUp => {
                info!("MQTT | connected");
            }
            AppEvent::LinkDown => {
                warn!("MQTT | disconnected");
            }
            AppEvent::Started { refills } => {
                info!("START | refills={}", refills);
            }
        }
    }
}
