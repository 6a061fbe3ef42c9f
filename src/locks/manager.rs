//! The lock manager: acquisition, release, and administrative clearing.
//!
//! All policy lives here. Each operation takes a non-exclusive hold on the
//! table to check the slot, transitions to the exclusive hold, re-validates,
//! and only then talks to the backend, so the slow backend call is made
//! by exactly one winner while the claim is protected.

use super::table::{LockSlot, LockTable};
use super::types::LockInfo;
use crate::backend::DatastoreBackend;
use crate::config::Config;
use crate::datastore::Datastore;
use crate::error::{LockError, Result};
use crate::events::{AuditLog, Event, EventAction};
use crate::session::SessionRef;
use chrono::{DateTime, Utc};
use serde_json::json;

/// Exclusive-lock manager for the configuration datastores.
///
/// One value is constructed by the server process and shared by reference
/// with every request-handling context. The manager owns the lock table; the
/// backend is owned by the caller and passed in per call, already bound to
/// the requesting session's storage context.
pub struct LockManager {
    table: LockTable,
    stale_minutes: u32,
    audit: Option<AuditLog>,
}

impl LockManager {
    /// Create a manager with default settings and no audit log.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a manager from a loaded [`Config`].
    pub fn with_config(config: &Config) -> Self {
        Self {
            table: LockTable::new(),
            stale_minutes: config.lock_stale_minutes,
            audit: config.audit_log.as_ref().map(AuditLog::new),
        }
    }

    /// Lock `datastore` for `session`.
    ///
    /// Fails with [`LockError::Conflict`] if any session holds the lock,
    /// including `session` itself; re-entrant locking is never granted. Fails
    /// with [`LockError::Denied`] if the backend refuses, in which case the
    /// table is left exactly as it was.
    pub fn acquire(
        &self,
        datastore: Datastore,
        session: &SessionRef,
        backend: &dyn DatastoreBackend,
    ) -> Result<()> {
        {
            let slots = self.table.read();
            if let Some(holder) = slots.slot(datastore).holder() {
                return Err(LockError::Conflict {
                    datastore,
                    holder: holder.clone(),
                });
            }
        }

        let mut slots = self.table.write();
        // Check again: the slot can be claimed between dropping the read
        // guard and taking the write guard.
        if let Some(holder) = slots.slot(datastore).holder() {
            return Err(LockError::Conflict {
                datastore,
                holder: holder.clone(),
            });
        }

        if let Err(denial) = backend.lock(datastore) {
            // Lock is held outside this process; record nothing locally.
            drop(slots);
            self.record(
                Event::new(EventAction::LockDenied)
                    .with_session(session.id())
                    .with_datastore(datastore)
                    .with_details(json!({"op": "lock", "reason": denial.to_string()})),
            );
            return Err(LockError::Denied { datastore, denial });
        }

        slots.slot_mut(datastore).claim(session.clone(), Utc::now());
        drop(slots);

        self.record(
            Event::new(EventAction::Lock)
                .with_session(session.id())
                .with_datastore(datastore),
        );
        Ok(())
    }

    /// Unlock `datastore`, which must be held by `session`.
    ///
    /// Fails with [`LockError::NotLocked`] when the slot is free and with
    /// [`LockError::Conflict`] when another session holds it; a lock can
    /// never be released (or stolen) by a session that does not hold it. On
    /// success, uncommitted working changes for the datastore are discarded
    /// through the backend along with the lock.
    pub fn release(
        &self,
        datastore: Datastore,
        session: &SessionRef,
        backend: &dyn DatastoreBackend,
    ) -> Result<()> {
        {
            let slots = self.table.read();
            ensure_held_by(slots.slot(datastore), datastore, session)?;
        }

        let mut slots = self.table.write();
        // Only the holding session may transition the slot, so the state
        // should not have changed across the guard switch. Do not assume.
        ensure_held_by(slots.slot(datastore), datastore, session)?;

        if let Err(denial) = backend.unlock(datastore) {
            // The backend's record disagrees; keep ours untouched.
            drop(slots);
            self.record(
                Event::new(EventAction::LockDenied)
                    .with_session(session.id())
                    .with_datastore(datastore)
                    .with_details(json!({"op": "unlock", "reason": denial.to_string()})),
            );
            return Err(LockError::Denied { datastore, denial });
        }

        // Dropping the lock also drops any uncommitted working changes.
        backend.discard_changes(datastore);
        slots.slot_mut(datastore).clear();
        drop(slots);

        self.record(
            Event::new(EventAction::Unlock)
                .with_session(session.id())
                .with_datastore(datastore),
        );
        Ok(())
    }

    /// Force-clear every slot held by a terminating session.
    ///
    /// The session-lifecycle layer must call this on teardown: a lock whose
    /// owner is gone can never come back through [`LockManager::release`].
    /// Backend unlock and discard are attempted per datastore, but the slot
    /// is cleared even if the backend refuses: keeping a dead session's hold
    /// would wedge the datastore until restart. Refusals are recorded in the
    /// audit log. Returns the datastores that were cleared.
    pub fn release_session(
        &self,
        session: &SessionRef,
        backend: &dyn DatastoreBackend,
    ) -> Vec<Datastore> {
        let mut cleared = Vec::new();
        let mut refused = Vec::new();

        {
            let mut slots = self.table.write();
            for datastore in Datastore::ALL {
                let held = slots
                    .slot(datastore)
                    .holder()
                    .is_some_and(|holder| holder.id() == session.id());
                if !held {
                    continue;
                }

                match backend.unlock(datastore) {
                    Ok(()) => backend.discard_changes(datastore),
                    Err(denial) => refused.push(json!({
                        "datastore": datastore.as_str(),
                        "reason": denial.to_string(),
                    })),
                }

                slots.slot_mut(datastore).clear();
                cleared.push(datastore);
            }
        }

        if !cleared.is_empty() {
            let names: Vec<&str> = cleared.iter().map(|ds| ds.as_str()).collect();
            self.record(
                Event::new(EventAction::SessionClosed)
                    .with_session(session.id())
                    .with_details(json!({"cleared": names, "unlock_refused": refused})),
            );
        }
        cleared
    }

    /// Administrative override: clear the lock on `datastore` regardless of
    /// who holds it.
    ///
    /// Touches the local table only; the caller is responsible for verifying
    /// that clearing is appropriate and for reconciling the backend. Returns
    /// a snapshot of the cleared hold for audit purposes.
    pub fn clear(&self, datastore: Datastore) -> Result<LockInfo> {
        let info = {
            let mut slots = self.table.write();
            let info = self
                .snapshot(slots.slot(datastore), datastore)
                .ok_or(LockError::NotLocked(datastore))?;
            slots.slot_mut(datastore).clear();
            info
        };

        self.record(
            Event::new(EventAction::LockCleared)
                .with_session(info.holder.id())
                .with_datastore(datastore),
        );
        Ok(info)
    }

    /// Snapshot of every held lock.
    pub fn list_locks(&self) -> Vec<LockInfo> {
        let slots = self.table.read();
        Datastore::ALL
            .iter()
            .filter_map(|&datastore| self.snapshot(slots.slot(datastore), datastore))
            .collect()
    }

    /// The session currently holding `datastore`, if any.
    ///
    /// A diagnostic observation; it is stale by the time the caller looks at
    /// it and never a substitute for the checks `acquire`/`release` perform
    /// under the exclusive hold.
    pub fn holder(&self, datastore: Datastore) -> Option<SessionRef> {
        self.table.read().slot(datastore).holder().cloned()
    }

    fn snapshot(&self, slot: &LockSlot, datastore: Datastore) -> Option<LockInfo> {
        let holder = slot.holder()?.clone();
        let acquired_at = slot.acquired_at()?;
        Some(LockInfo {
            datastore,
            holder,
            acquired_at,
            is_stale: self.is_stale(acquired_at),
        })
    }

    fn is_stale(&self, acquired_at: DateTime<Utc>) -> bool {
        Utc::now().signed_duration_since(acquired_at).num_minutes() > self.stale_minutes as i64
    }

    /// Append an audit event, if auditing is configured. Audit failures are
    /// warned and swallowed; they never fail the lock operation itself.
    fn record(&self, event: Event) {
        if let Some(audit) = &self.audit
            && let Err(e) = audit.append(&event)
        {
            eprintln!("Warning: failed to record lock audit event: {}", e);
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail unless `slot` is held by exactly `session`.
fn ensure_held_by(slot: &LockSlot, datastore: Datastore, session: &SessionRef) -> Result<()> {
    match slot.holder() {
        None => Err(LockError::NotLocked(datastore)),
        Some(holder) if holder.id() != session.id() => Err(LockError::Conflict {
            datastore,
            holder: holder.clone(),
        }),
        Some(_) => Ok(()),
    }
}
