//! Override sequencer with priority-based selection.
//!
//! Holds one request slot per override layer and answers, for a given
//! instant, which [`Override`] is active.  Timed overrides (refill pulse,
//! network joined, update finished, update failure) expire on their own;
//! the control loop only asks [`IndicatorSequencer::current`] once per
//! tick, so nothing here ever blocks.
//!
//! | Override        | Lifetime                            |
//! |-----------------|-------------------------------------|
//! | Error (fault)   | while the fault flag is set         |
//! | Error (update)  | 2 s after an update failure         |
//! | UpdateStarted   | until the next update event         |
//! | UpdateProgress  | until the next update event         |
//! | UpdateFinished  | 500 ms                              |
//! | RefillPulse     | 3 × (100 ms on, 100 ms off)         |
//! | Joined          | 500 ms                              |
//! | Connecting      | while the flag is set               |

use super::Override;
use crate::app::events::UpdateEvent;

pub const PULSE_BLINKS: u64 = 3;
pub const PULSE_STEP_MS: u64 = 100;
pub const UPDATE_DONE_HOLD_MS: u64 = 500;
pub const UPDATE_ERROR_HOLD_MS: u64 = 2000;
pub const JOINED_HOLD_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateSlot {
    Started,
    Progress { done: u32, total: u32 },
    Finished { until_ms: u64 },
}

/// Override sequencer.  Stack-allocated, no heap.
#[derive(Debug, Default)]
pub struct IndicatorSequencer {
    fault: bool,
    error_until_ms: Option<u64>,
    update: Option<UpdateSlot>,
    pulse_started_ms: Option<u64>,
    joined_until_ms: Option<u64>,
    connecting: bool,
}

impl IndicatorSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the connecting layer.
    pub fn set_connecting(&mut self, active: bool) {
        self.connecting = active;
    }

    /// Set or clear the persistent error layer (sensor fault).
    pub fn set_fault(&mut self, active: bool) {
        self.fault = active;
    }

    /// Restart the refill blink from `now_ms`.
    pub fn start_refill_pulse(&mut self, now_ms: u64) {
        self.pulse_started_ms = Some(now_ms);
    }

    /// Flash the joined colour, covering the connecting layer until it expires.
    pub fn flash_joined(&mut self, now_ms: u64) {
        self.joined_until_ms = Some(now_ms.saturating_add(JOINED_HOLD_MS));
    }

    /// Fold a firmware-update lifecycle event into the update layer.
    pub fn update_event(&mut self, event: UpdateEvent, now_ms: u64) {
        match event {
            UpdateEvent::Started => self.update = Some(UpdateSlot::Started),
            UpdateEvent::Progress { done, total } => {
                self.update = Some(UpdateSlot::Progress { done, total })
            }
            UpdateEvent::Finished => {
                self.update = Some(UpdateSlot::Finished {
                    until_ms: now_ms.saturating_add(UPDATE_DONE_HOLD_MS),
                })
            }
            UpdateEvent::Failed => {
                self.update = None;
                self.error_until_ms = Some(now_ms.saturating_add(UPDATE_ERROR_HOLD_MS));
            }
        }
    }

    /// Whether any timed or flagged override is still pending.
    pub fn is_idle(&self) -> bool {
        !self.fault
            && !self.connecting
            && self.error_until_ms.is_none()
            && self.update.is_none()
            && self.pulse_started_ms.is_none()
            && self.joined_until_ms.is_none()
    }

    /// Expire finished layers and return the highest-priority override.
    pub fn current(&mut self, now_ms: u64) -> Option<Override> {
        self.expire(now_ms);

        if self.fault || self.error_until_ms.is_some() {
            return Some(Override::Error);
        }
        if let Some(slot) = self.update {
            return Some(match slot {
                UpdateSlot::Started => Override::UpdateStarted,
                UpdateSlot::Progress { done, total } => Override::UpdateProgress { done, total },
                UpdateSlot::Finished { .. } => Override::UpdateFinished,
            });
        }
        if let Some(start) = self.pulse_started_ms {
            let step = now_ms.saturating_sub(start) / PULSE_STEP_MS;
            return Some(Override::RefillPulse { lit: step % 2 == 0 });
        }
        if self.joined_until_ms.is_some() {
            return Some(Override::Joined);
        }
        if self.connecting {
            return Some(Override::Connecting);
        }
        None
    }

    fn expire(&mut self, now_ms: u64) {
        if self.error_until_ms.is_some_and(|until| now_ms >= until) {
            self.error_until_ms = None;
        }
        if self.joined_until_ms.is_some_and(|until| now_ms >= until) {
            self.joined_until_ms = None;
        }
        if let Some(UpdateSlot::Finished { until_ms }) = self.update {
            if now_ms >= until_ms {
                self.update = None;
            }
        }
        if let Some(start) = self.pulse_started_ms {
            if now_ms.saturating_sub(start) >= PULSE_BLINKS * 2 * PULSE_STEP_MS {
                self.pulse_started_ms = None;
            }
        }
    }
}
