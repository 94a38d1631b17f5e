//! Tank level monitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channels;
pub mod config;
pub mod error;
pub mod indicator;
pub mod monitor;
pub mod telemetry;

// Hardware-facing modules; each carries its own simulation twin.
pub mod adapters;
pub mod drivers;
pub mod sensors;
