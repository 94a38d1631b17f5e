//! Unified error types for the tank-level firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be carried through [`AppEvent`](crate::app::events::AppEvent)s and
//! logged without allocation.
//!
//! None of these are fatal.  The service absorbs each one at the tick
//! boundary and keeps running on the next cadence.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The range sensor produced no usable sample this tick.
    Sensor(SensorError),
    /// The telemetry transport could not take a publication.
    Transport(TransportError),
    /// Durable storage rejected a read or write.
    Persistence(StorageError),
    /// An inbound command payload was not understood.
    Command(CommandError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No measurement completed within the configured sensor timeout.
    Timeout,
    /// The current measurement period has not finished yet.
    NotReady,
    /// The I2C transaction failed.
    Bus,
    /// The device on the bus did not identify as a VL53L0X.
    WrongDevice(u8),
    /// The requested timing budget is shorter than the enabled steps need.
    Budget(u32),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "measurement timed out"),
            Self::NotReady => write!(f, "measurement not ready"),
            Self::Bus => write!(f, "I2C bus error"),
            Self::WrongDevice(id) => write!(f, "unexpected model id 0x{id:02X}"),
            Self::Budget(us) => write!(f, "timing budget {us}us too short"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No broker session; the publication was suppressed.
    Unavailable,
    /// The client refused the publication (queue full, payload too large).
    PublishFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "transport unavailable"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Blank payload, e.g. the broker echoing back a cleared command.
    Empty,
    /// Payload is not a recognised command.
    Unknown,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown => write!(f, "unknown command"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
