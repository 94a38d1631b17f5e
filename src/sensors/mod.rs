//! Sensor subsystem.
//!
//! A single VL53L0X time-of-flight sensor measures the distance from the
//! tank lid to the water surface.  [`range::RangeSensor`] is the driver;
//! [`HardwareAdapter`](crate::adapters::hardware::HardwareAdapter) exposes
//! it through the [`SensorPort`](crate::app::ports::SensorPort).

pub mod range;
