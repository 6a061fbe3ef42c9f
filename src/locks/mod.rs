//! Locking subsystem for dslock.
//!
//! This module implements the exclusive-lock model for the configuration
//! datastores:
//! - A fixed lock table, one slot per datastore, guarded by a single
//!   reader/writer lock (`table`)
//! - The lock manager holding all acquisition/release policy (`manager`)
//!
//! # Ownership Model
//!
//! At most one session holds a datastore at any instant. Acquisition is never
//! re-entrant and never queued: a request against a held datastore fails
//! immediately with a conflict naming the holder. Releases require ownership.
//!
//! # Backend Reconciliation
//!
//! The table mirrors an external authority. The manager claims a slot only
//! after the backend grants the lock and clears it only after the backend
//! relinquishes it, both while holding the table's exclusive hold, so the
//! local record and the authoritative one move together. The one exception is
//! session teardown, where the slot is cleared unconditionally.

mod manager;
mod table;
mod types;


// Re-export public API
pub use manager::LockManager;
pub use types::LockInfo;
