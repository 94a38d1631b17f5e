//! Output drivers and peripheral helpers.

pub mod led_ring;
pub mod watchdog;
