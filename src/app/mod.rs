//! Application core: orchestration of the monitor logic, zero I/O.
//!
//! The [`service`] ties the level estimator, refill detector, publish gate,
//! refill counter and indicator together.  All interaction with hardware,
//! storage and the broker happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
