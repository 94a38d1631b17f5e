//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the range sensor and the LED ring, exposing them through
//! [`SensorPort`] and [`IndicatorPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets the ring
//! keeps its pixels in memory and the sensor runs over whatever
//! [`I2c`] bus it is given.

use embedded_hal::i2c::I2c;

use crate::app::ports::{IndicatorPort, SensorPort};
use crate::drivers::led_ring::LedRing;
use crate::error::SensorError;
use crate::indicator::Directive;
use crate::monitor::Distance;
use crate::sensors::range::RangeSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C> {
    sensor: RangeSensor<I2C>,
    ring: LedRing,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(sensor: RangeSensor<I2C>, ring: LedRing) -> Self {
        Self { sensor, ring }
    }

    pub fn ring(&self) -> &LedRing {
        &self.ring
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C: I2c> SensorPort for HardwareAdapter<I2C> {
    fn read_distance(&mut self, now_ms: u64) -> Result<Distance, SensorError> {
        self.sensor.read_mm(now_ms)
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<I2C: I2c> IndicatorPort for HardwareAdapter<I2C> {
    fn set_indicator(&mut self, directive: Directive) {
        self.ring.show(directive);
    }
}
