//! Level monitoring: pure decision logic, zero I/O.
//!
//! ```text
//!   Distance ──▶ LevelEstimator ──▶ FillLevel ─┬─▶ RefillDetector ──▶ RefillCounter
//!                                              ├─▶ PublishGate
//!                                              └─▶ IndicatorMapper
//! ```
//!
//! Each component owns its own state struct; the
//! [`AppService`](crate::app::service::AppService) threads one freshly
//! computed [`FillLevel`] through all of them per tick.

pub mod counter;
pub mod estimator;
pub mod gate;
pub mod refill;

/// Raw sensor distance in millimetres.  May lie outside the calibration range.
pub type Distance = u16;

/// Fill level as a percentage in `[0, 100]`.
pub type FillLevel = f32;

/// One processed sample: the distance that went in and the level that came out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub distance_mm: Distance,
    pub level: FillLevel,
}
