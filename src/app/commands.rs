//! Inbound commands to the application service.
//!
//! These arrive as raw payloads on the command topic and are parsed here
//! before the [`AppService`](super::service::AppService) acts on them.

use crate::error::CommandError;

/// Payload that resets the refill counter.
pub const RESET_REFILL_COUNTER: &str = "reset_refill_counter";

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Zero the refill counter (persisted and re-announced).
    ResetRefillCounter,
}

impl AppCommand {
    /// Parse a command payload.  Surrounding whitespace is ignored.
    pub fn parse(payload: &[u8]) -> Result<Self, CommandError> {
        let text = core::str::from_utf8(payload).map_err(|_| CommandError::Unknown)?;
        match text.trim() {
            "" => Err(CommandError::Empty),
            RESET_REFILL_COUNTER => Ok(Self::ResetRefillCounter),
            _ => Err(CommandError::Unknown),
        }
    }
}
