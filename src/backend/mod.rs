//! Backend storage boundary.
//!
//! The lock table is only a local mirror: the storage system underneath is the
//! authority on whether a datastore is actually lockable, because entities
//! outside this process can hold locks the manager never sees. Every acquire
//! and release is therefore delegated through [`DatastoreBackend`], and the
//! table is updated only after the backend agrees.
//!
//! The manager does not retain the backend it is handed; the caller owns the
//! backend session and passes it in per call, already bound to the right
//! target context.

mod memory;

pub use memory::MemoryBackend;

use crate::datastore::Datastore;
use std::fmt;

/// Authoritative lock operations on the storage layer.
pub trait DatastoreBackend {
    /// Take the storage-layer lock on `datastore`.
    ///
    /// A refusal means an entity this process cannot see holds the lock; the
    /// returned denial carries whatever detail the backend can report.
    fn lock(&self, datastore: Datastore) -> Result<(), BackendDenial>;

    /// Relinquish the storage-layer lock on `datastore`.
    fn unlock(&self, datastore: Datastore) -> Result<(), BackendDenial>;

    /// Drop uncommitted working changes for `datastore`.
    ///
    /// Called after a successful unlock; a no-op for datastores without a
    /// working-changes notion. Best-effort: failures must not abort the
    /// release, so this reports nothing.
    fn discard_changes(&self, datastore: Datastore);
}

/// Structured detail attached to a backend refusal.
///
/// Carries the backend's primary message plus any further error lines it
/// reported, so the caller can surface the full cause instead of a bare
/// "denied".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDenial {
    message: String,
    details: Vec<String>,
}

impl BackendDenial {
    /// Create a denial with the backend's primary message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attach a further detail line reported by the backend.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// The backend's primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Additional detail lines, in the order the backend reported them.
    pub fn details(&self) -> &[String] {
        &self.details
    }
}

impl fmt::Display for BackendDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.details.is_empty() {
            write!(f, " ({})", self.details.join("; "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_display_without_details() {
        let denial = BackendDenial::new("datastore is locked");
        assert_eq!(denial.to_string(), "datastore is locked");
    }

    #[test]
    fn denial_display_joins_details() {
        let denial = BackendDenial::new("datastore is locked")
            .with_detail("held by pid 4211")
            .with_detail("since 2024-03-01");
        assert_eq!(
            denial.to_string(),
            "datastore is locked (held by pid 4211; since 2024-03-01)"
        );
        assert_eq!(denial.details().len(), 2);
    }
}
