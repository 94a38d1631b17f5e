//! Refill detection: a time-windowed rising-edge detector.
//!
//! ## Window lifecycle
//!
//! 1. The first observed level becomes the `baseline` and opens a window.
//! 2. While `now - window_start <= window`, every level is compared with the
//!    baseline.  The first rise of at least `threshold` flags a refill and
//!    moves the detector to [`RefillPhase::Refilling`].  The baseline is
//!    left alone, so later samples in the same window cannot count again.
//! 3. The first sample after the window has elapsed re-arms the detector:
//!    phase back to `Idle`, baseline and window start moved to that sample.
//!    The re-arming sample itself is never compared.
//!
//! A sample landing exactly on `window_start + window` still belongs to the
//! old window.

use super::FillLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillPhase {
    /// No refill flagged in the current window.
    Idle,
    /// A refill was already counted in the current window.
    Refilling,
}

/// Detector state, present once the first level has been observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefillWindowState {
    pub baseline: FillLevel,
    pub window_start_ms: u64,
    pub phase: RefillPhase,
}

/// Emitted on the sample that crosses the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefillDetected {
    pub baseline: FillLevel,
    pub level: FillLevel,
}

impl RefillDetected {
    /// Rise relative to the window baseline, in percentage points.
    pub fn delta(&self) -> f32 {
        self.level - self.baseline
    }
}

pub struct RefillDetector {
    threshold: f32,
    window_ms: u64,
    state: Option<RefillWindowState>,
}

impl RefillDetector {
    pub fn new(threshold: f32, window_ms: u32) -> Self {
        Self {
            threshold,
            window_ms: u64::from(window_ms),
            state: None,
        }
    }

    /// Feed one level estimate taken at `now_ms`.
    pub fn observe(&mut self, level: FillLevel, now_ms: u64) -> Option<RefillDetected> {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(RefillWindowState {
                baseline: level,
                window_start_ms: now_ms,
                phase: RefillPhase::Idle,
            });
            return None;
        };

        let elapsed = now_ms.saturating_sub(state.window_start_ms);
        if elapsed > self.window_ms {
            state.phase = RefillPhase::Idle;
            state.baseline = level;
            state.window_start_ms = now_ms;
            return None;
        }

        if state.phase == RefillPhase::Idle && level - state.baseline >= self.threshold {
            state.phase = RefillPhase::Refilling;
            return Some(RefillDetected {
                baseline: state.baseline,
                level,
            });
        }
        None
    }

    pub fn state(&self) -> Option<&RefillWindowState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> RefillPhase {
        self.state.map_or(RefillPhase::Idle, |s| s.phase)
    }
}
