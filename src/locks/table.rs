//! The lock table: ownership state per datastore.
//!
//! The table is a protected container with no policy of its own; all locking
//! decisions live in the manager. One slot exists per datastore, created once
//! and never resized, and a single reader/writer lock guards the whole table.
//! Holds are scoped per call and never survive a manager operation.

use crate::datastore::Datastore;
use crate::session::SessionRef;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ownership record for one datastore.
///
/// `holder` and `acquired_at` are set and cleared together; `claim` and
/// `clear` are the only mutators, so a slot is never half-populated.
pub(crate) struct LockSlot {
    holder: Option<SessionRef>,
    acquired_at: Option<DateTime<Utc>>,
}

impl LockSlot {
    const fn free() -> Self {
        Self {
            holder: None,
            acquired_at: None,
        }
    }

    /// The session recorded as holding this slot, if any.
    pub(crate) fn holder(&self) -> Option<&SessionRef> {
        self.holder.as_ref()
    }

    /// When the current hold was taken; `None` while the slot is free.
    pub(crate) fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.acquired_at
    }

    /// Record `session` as the holder.
    pub(crate) fn claim(&mut self, session: SessionRef, at: DateTime<Utc>) {
        debug_assert!(self.holder.is_none(), "claiming a held slot");
        self.holder = Some(session);
        self.acquired_at = Some(at);
    }

    /// Return the slot to the free state.
    pub(crate) fn clear(&mut self) {
        self.holder = None;
        self.acquired_at = None;
    }
}

/// The fixed slot array, indexed by datastore.
pub(crate) struct Slots([LockSlot; Datastore::ALL.len()]);

impl Slots {
    pub(crate) fn slot(&self, datastore: Datastore) -> &LockSlot {
        &self.0[datastore.index()]
    }

    pub(crate) fn slot_mut(&mut self, datastore: Datastore) -> &mut LockSlot {
        &mut self.0[datastore.index()]
    }
}

/// Process-wide lock ownership state, shared by every session's requests.
pub(crate) struct LockTable {
    slots: RwLock<Slots>,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: RwLock::new(Slots([LockSlot::free(), LockSlot::free(), LockSlot::free()])),
        }
    }

    /// Non-exclusive hold for observations.
    ///
    /// An observation made under this guard is stale the moment the guard is
    /// dropped; never carry it across a transition to `write` without
    /// re-checking under the exclusive hold.
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read()
    }

    /// Exclusive hold for claiming and clearing slots.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write()
    }
}
