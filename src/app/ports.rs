//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (range sensor, LED ring, MQTT client, NVS) implement these
//! traits.  The [`AppService`](super::service::AppService) consumes them via
//! generics, so the domain core never touches hardware or the network directly.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use crate::config::SystemConfig;
use crate::error::{SensorError, TransportError};
use crate::indicator::Directive;
use crate::monitor::{Distance, FillLevel};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain polls this once per tick.
pub trait SensorPort {
    /// Fetch the latest distance sample without blocking.
    ///
    /// `Err(SensorError::NotReady)` means the measurement period has not
    /// elapsed yet; `Err(SensorError::Timeout)` means the sensor stalled.
    fn read_distance(&mut self, now_ms: u64) -> Result<Distance, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the visual indicator.
pub trait IndicatorPort {
    /// Show an abstract colour directive.  Rendering is up to the adapter.
    fn set_indicator(&mut self, directive: Directive);
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry intents.  The adapter owns topics, framing and the
/// retained-delivery flag; the domain only says *what* to announce.
pub trait TelemetryPort {
    /// Whether a broker session is currently up.
    fn is_available(&self) -> bool;

    /// Announce a new fill level together with the distance it came from.
    fn publish_fill_level(
        &mut self,
        level: FillLevel,
        distance_mm: Distance,
    ) -> Result<(), TransportError>;

    /// Announce the current refill count.
    fn publish_refill_count(&mut self, count: u32) -> Result<(), TransportError>;

    /// Announce availability and firmware version after (re)connecting.
    fn announce(&mut self, firmware: &str) -> Result<(), TransportError>;

    /// Acknowledge a processed command by clearing the retained command slot.
    fn clear_command(&mut self) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Counter store (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Durable unsigned-integer store, keyed inside one fixed namespace.
pub trait CounterStore {
    /// Read `key`, returning `default` if it has never been written.
    fn get_u32(&self, key: &str, default: u32) -> Result<u32, StorageError>;

    /// Write `key` and commit before returning.
    fn put_u32(&mut self, key: &str, value: u32) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`CounterStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error (partition missing, flash failure).
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
