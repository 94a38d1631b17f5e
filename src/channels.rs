//! Inter-task link-event channel.
//!
//! The MQTT client delivers its events on its own task.  This bounded
//! `embassy-sync` channel bridges that task with the synchronous control
//! loop, which is the only place core state is mutated.
//!
//! ```text
//! ┌──────────────┐  LinkEvent  ┌──────────────┐
//! │ MQTT callback│───────────▶│ Control Loop │
//! │  (own task)  │             │  (sync)      │
//! └──────────────┘             └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::events::LinkEvent;

/// Channel depth for link events.
pub const LINK_DEPTH: usize = 8;

/// MQTT callback → control loop.
pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, LINK_DEPTH> = Channel::new();

/// Queue an event without blocking.  Returns `false` if the queue was full
/// and the event was dropped.
pub fn push_link_event(event: LinkEvent) -> bool {
    LINK_EVENTS.try_send(event).is_ok()
}

/// Take the next queued event, if any.
pub fn next_link_event() -> Option<LinkEvent> {
    LINK_EVENTS.try_receive().ok()
}
