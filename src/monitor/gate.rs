//! Publish gate: hysteresis between sampling and transmission.
//!
//! A level is announced when nothing has been announced yet, or when it
//! differs from the last announced level by at least the threshold.

use super::FillLevel;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PublishGateState {
    pub last_announced: Option<FillLevel>,
}

#[derive(Debug, Clone, Copy)]
pub struct PublishGate {
    threshold: f32,
}

impl PublishGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Returns `true` and records `current` as announced when a publish is due.
    /// Leaves `state` untouched otherwise.
    pub fn should_publish(&self, current: FillLevel, state: &mut PublishGateState) -> bool {
        let due = match state.last_announced {
            None => true,
            Some(last) => (current - last).abs() >= self.threshold,
        };
        if due {
            state.last_announced = Some(current);
        }
        due
    }
}
