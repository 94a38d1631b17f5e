//! Distance → fill level conversion.
//!
//! Inverse-linear mapping clamped to the calibration bounds: a distance at
//! or below `full_mm` reads 100 %, at or above `empty_mm` reads 0 %.

use super::{Distance, FillLevel};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEstimator {
    full_mm: Distance,
    empty_mm: Distance,
}

impl LevelEstimator {
    /// Build an estimator for the given calibration.
    ///
    /// Fails unless `full_mm < empty_mm` (smaller distance = fuller tank).
    pub fn new(full_mm: Distance, empty_mm: Distance) -> Result<Self, Error> {
        if full_mm >= empty_mm {
            return Err(Error::Config("full_mm must be below empty_mm"));
        }
        Ok(Self { full_mm, empty_mm })
    }

    pub fn estimate(&self, distance: Distance) -> FillLevel {
        let clamped = distance.clamp(self.full_mm, self.empty_mm);
        let span = f32::from(self.empty_mm - self.full_mm);
        f32::from(self.empty_mm - clamped) / span * 100.0
    }

    pub fn full_mm(&self) -> Distance {
        self.full_mm
    }

    pub fn empty_mm(&self) -> Distance {
        self.empty_mm
    }
}
