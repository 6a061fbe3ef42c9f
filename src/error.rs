//! Error types for dslock.
//!
//! Uses thiserror for derive macros. Every lock operation fails with exactly
//! one of these variants, and a failure never leaves a partial mutation in the
//! lock table behind.

use crate::backend::BackendDenial;
use crate::datastore::Datastore;
use crate::session::SessionRef;
use thiserror::Error;

/// Main error type for dslock operations.
///
/// The first four variants map one-to-one onto the failure kinds a caller has
/// to translate into its own protocol errors; `Config` and `Audit` cover the
/// crate's own plumbing.
#[derive(Error, Debug)]
pub enum LockError {
    /// The datastore name is not one of the known identifiers.
    ///
    /// A well-formed caller resolves the target before calling into the lock
    /// manager, so this is a protocol/internal error, not a locking conflict.
    #[error("unrecognized datastore '{0}'")]
    UnknownDatastore(String),

    /// The datastore is locked and the requesting session may not take or
    /// transition it. The holder is named so the caller can report who is in
    /// the way.
    #[error("datastore '{datastore}' is locked by {holder}")]
    Conflict {
        datastore: Datastore,
        holder: SessionRef,
    },

    /// Release was requested on a datastore that has no active lock.
    #[error("datastore '{0}' is not locked")]
    NotLocked(Datastore),

    /// The backend refused to lock or unlock the datastore, e.g. because an
    /// entity outside this process already holds it at the storage layer.
    #[error("backend denied the operation on datastore '{datastore}': {denial}")]
    Denied {
        datastore: Datastore,
        denial: BackendDenial,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The audit log could not be written.
    #[error("audit log error: {0}")]
    Audit(String),
}

impl LockError {
    /// The session currently holding the contested lock, when this failure
    /// names one.
    pub fn conflicting_holder(&self) -> Option<&SessionRef> {
        match self {
            LockError::Conflict { holder, .. } => Some(holder),
            _ => None,
        }
    }
}

/// Result type alias for dslock operations.
pub type Result<T> = std::result::Result<T, LockError>;
