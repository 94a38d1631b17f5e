//! System configuration parameters
//!
//! All tunable parameters for the tank-level monitor.
//! Values can be overridden via NVS (non-volatile storage).  At boot
//! [`load_or_repair`] reads the stored blob and rewrites it with defaults
//! when it is corrupted or out of range.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};

/// Firmware version announced on connect and carried in the state document.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Calibration ---
    /// Sensor distance (mm) that reads as a full tank (100 %)
    pub full_mm: u16,
    /// Sensor distance (mm) that reads as an empty tank (0 %)
    pub empty_mm: u16,
    /// Mounting offset added to every raw reading (mm)
    pub sensor_offset_mm: i16,

    // --- Refill detection ---
    /// Minimum rise within one window that counts as a refill (percentage points)
    pub refill_threshold_pct: f32,
    /// Length of the refill detection window (milliseconds)
    pub refill_window_ms: u32,

    // --- Publishing ---
    /// Minimum change before a new fill level is published (percentage points)
    pub publish_threshold_pct: f32,
    /// Delay between broker reconnect attempts (milliseconds)
    pub reconnect_interval_ms: u32,

    // --- Sensor timing ---
    /// Control loop cadence (milliseconds)
    pub sample_interval_ms: u32,
    /// Time-of-flight inter-measurement period (milliseconds)
    pub sensor_period_ms: u32,
    /// Maximum wait for a fresh measurement before reporting a timeout (milliseconds)
    pub sensor_timeout_ms: u32,
    /// Consecutive `Timeout`/`Bus` sensor results before the indicator shows
    /// the error state.  `NotReady` polls neither count nor reset the run.
    pub sensor_fault_samples: u32,

    // --- Indicator ---
    /// Number of pixels on the LED ring
    pub led_count: u8,
    /// Global ring brightness (0-255)
    pub led_brightness: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Calibration
            full_mm: 45,
            empty_mm: 250,
            sensor_offset_mm: 0,

            // Refill detection
            refill_threshold_pct: 50.0,
            refill_window_ms: 10_000, // 10 s

            // Publishing
            publish_threshold_pct: 10.0,
            reconnect_interval_ms: 5_000,

            // Sensor timing
            sample_interval_ms: 100,  // 10 Hz loop
            sensor_period_ms: 1_000,  // 1 Hz ranging
            sensor_timeout_ms: 500,
            sensor_fault_samples: 20,

            // Indicator
            led_count: 16,
            led_brightness: 50,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.
    ///
    /// Invalid values are rejected, never clamped: a calibration with
    /// `full_mm >= empty_mm` would invert the fill level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.full_mm >= self.empty_mm {
            return Err(ConfigError::ValidationFailed(
                "full_mm must be below empty_mm",
            ));
        }
        if self.empty_mm > 2_000 {
            return Err(ConfigError::ValidationFailed("empty_mm must be 1–2000"));
        }
        if !(-500..=500).contains(&self.sensor_offset_mm) {
            return Err(ConfigError::ValidationFailed(
                "sensor_offset_mm must be -500–500",
            ));
        }
        if !(1.0..=100.0).contains(&self.refill_threshold_pct) {
            return Err(ConfigError::ValidationFailed(
                "refill_threshold_pct must be 1.0–100.0",
            ));
        }
        if !(1_000..=600_000).contains(&self.refill_window_ms) {
            return Err(ConfigError::ValidationFailed(
                "refill_window_ms must be 1000–600000",
            ));
        }
        if !(0.5..=100.0).contains(&self.publish_threshold_pct) {
            return Err(ConfigError::ValidationFailed(
                "publish_threshold_pct must be 0.5–100.0",
            ));
        }
        if !(500..=300_000).contains(&self.reconnect_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "reconnect_interval_ms must be 500–300000",
            ));
        }
        if !(10..=5_000).contains(&self.sample_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sample_interval_ms must be 10–5000",
            ));
        }
        if !(20..=10_000).contains(&self.sensor_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor_period_ms must be 20–10000",
            ));
        }
        if !(50..=10_000).contains(&self.sensor_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor_timeout_ms must be 50–10000",
            ));
        }
        if self.sensor_fault_samples == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_fault_samples must be at least 1",
            ));
        }
        if self.led_count == 0 || self.led_count > crate::drivers::led_ring::MAX_LEDS as u8 {
            return Err(ConfigError::ValidationFailed("led_count must be 1–64"));
        }
        Ok(())
    }
}

/// Load the stored config, repairing the store when it cannot be used.
///
/// A corrupted or invalid blob is replaced with the defaults so the next
/// boot reads cleanly.  A storage I/O failure leaves the store untouched.
pub fn load_or_repair(port: &mut impl ConfigPort) -> SystemConfig {
    let reason = match port.load() {
        Ok(cfg) => match cfg.validate() {
            Ok(()) => return cfg,
            Err(e) => e,
        },
        Err(ConfigError::IoError) => {
            warn!("CONFIG | store unreadable, using defaults");
            return SystemConfig::default();
        }
        Err(e) => e,
    };

    warn!("CONFIG | stored config rejected ({}), restoring defaults", reason);
    let defaults = SystemConfig::default();
    match port.save(&defaults) {
        Ok(()) => info!("CONFIG | defaults written"),
        Err(e) => warn!("CONFIG | repair failed: {}", e),
    }
    defaults
}
