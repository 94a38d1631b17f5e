//! Level indicator: maps a fill level (or an override state) to an
//! abstract colour directive for the LED ring.
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **Error**: solid red
//! 2. **Firmware update**: purple on start, blue progress bar, green when done
//! 3. **Refill pulse**: three blue blinks
//! 4. **Network joined**: green for half a second after the WiFi join
//! 5. **Connecting**: solid yellow
//! 6. **Level**: red → yellow → green gradient
//!
//! The mapping is pure.  Timing of the overrides lives in [`sequencer`].

pub mod sequencer;

pub use sequencer::IndicatorSequencer;

use crate::monitor::FillLevel;

/// Colour as (R, G, B), each 0–255.
pub type Rgb = (u8, u8, u8);

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_EMPTY: Rgb = (255, 0, 0); // Red
pub const COLOUR_HALF: Rgb = (255, 255, 0); // Yellow
pub const COLOUR_FULL: Rgb = (0, 255, 0); // Green
pub const COLOUR_CONNECTING: Rgb = (255, 255, 0); // Yellow
pub const COLOUR_JOINED: Rgb = (0, 255, 0); // Green
pub const COLOUR_REFILL: Rgb = (0, 0, 255); // Blue
pub const COLOUR_UPDATE_START: Rgb = (158, 37, 190); // Purple
pub const COLOUR_UPDATE_PROGRESS: Rgb = (0, 0, 255); // Blue
pub const COLOUR_UPDATE_DONE: Rgb = (0, 255, 0); // Green
pub const COLOUR_ERROR: Rgb = (255, 0, 0); // Red

/// Discrete states that take precedence over the level gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Connecting,
    Joined,
    /// One step of the refill blink; `lit == false` is the dark phase.
    RefillPulse { lit: bool },
    UpdateStarted,
    UpdateProgress { done: u32, total: u32 },
    UpdateFinished,
    Error,
}

/// What the display collaborator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Every pixel in one colour.
    Fill(Rgb),
    /// First `done / total` of the ring in `colour`, the rest dark.
    Progress { colour: Rgb, done: u32, total: u32 },
    Off,
}

/// Red-to-yellow over `[0, 50]`, yellow-to-green over `[50, 100]`.
pub fn map_level(level: FillLevel) -> Rgb {
    let scaled = (level.clamp(0.0, 100.0) * 5.1).round() as u16;
    if scaled <= 255 {
        (255, scaled as u8, 0)
    } else {
        (255 - (scaled - 255).min(255) as u8, 255, 0)
    }
}

/// Pick the directive for the current level and the active override, if any.
/// With neither available the ring is dark.
pub fn resolve(level: Option<FillLevel>, active: Option<Override>) -> Directive {
    match active {
        Some(Override::Error) => Directive::Fill(COLOUR_ERROR),
        Some(Override::UpdateStarted) => Directive::Fill(COLOUR_UPDATE_START),
        Some(Override::UpdateProgress { done, total }) => Directive::Progress {
            colour: COLOUR_UPDATE_PROGRESS,
            done,
            total,
        },
        Some(Override::UpdateFinished) => Directive::Fill(COLOUR_UPDATE_DONE),
        Some(Override::RefillPulse { lit: true }) => Directive::Fill(COLOUR_REFILL),
        Some(Override::RefillPulse { lit: false }) => Directive::Off,
        Some(Override::Joined) => Directive::Fill(COLOUR_JOINED),
        Some(Override::Connecting) => Directive::Fill(COLOUR_CONNECTING),
        None => match level {
            Some(l) => Directive::Fill(map_level(l)),
            None => Directive::Off,
        },
    }
}
