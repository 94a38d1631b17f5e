//! Durable refill counter.
//!
//! The in-memory count is the source of truth for the running process;
//! storage is best-effort durability across restarts.  Every mutation is
//! written through to the [`CounterStore`] immediately and the in-memory
//! value advances even when that write fails.
//!
//! ## Hydration guard
//!
//! The persisted value is loaded at most once, and only while the counter
//! has not been touched.  After any `increment`, `reset` or successful
//! `hydrate` the counter is *settled* and later loads are no-ops, which
//! keeps a reset that arrives before the first load (or a reconnect that
//! triggers a second load) from resurrecting a stale value.
//!
//! The count saturates at `u32::MAX` instead of wrapping.

use crate::app::ports::{CounterStore, StorageError};

/// Storage key for the refill count inside the firmware namespace.
pub const REFILLS_KEY: &str = "refills";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefillCounter {
    count: u32,
    settled: bool,
}

impl RefillCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether the in-memory value has become authoritative.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Count one refill and persist it.  Returns the new count; on a
    /// storage error the count has still advanced.
    pub fn increment(&mut self, store: &mut impl CounterStore) -> Result<u32, StorageError> {
        self.count = self.count.saturating_add(1);
        self.settled = true;
        self.persist(store)
    }

    /// Zero the counter and persist it.
    pub fn reset(&mut self, store: &mut impl CounterStore) -> Result<u32, StorageError> {
        self.count = 0;
        self.settled = true;
        self.persist(store)
    }

    /// Adopt a loaded value if the counter is still untouched.
    /// Returns `true` if the value was taken.
    pub fn hydrate(&mut self, loaded: u32) -> bool {
        if self.settled {
            return false;
        }
        self.count = loaded;
        self.settled = true;
        true
    }

    /// Read the persisted value and hydrate from it.
    ///
    /// Skips the read entirely once settled.  A failed read leaves the
    /// counter unsettled so a later call can retry.
    pub fn load(&mut self, store: &impl CounterStore) -> Result<bool, StorageError> {
        if self.settled {
            return Ok(false);
        }
        let loaded = store.get_u32(REFILLS_KEY, 0)?;
        Ok(self.hydrate(loaded))
    }

    fn persist(&self, store: &mut impl CounterStore) -> Result<u32, StorageError> {
        store.put_u32(REFILLS_KEY, self.count)?;
        Ok(self.count)
    }
}
