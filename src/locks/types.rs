//! Lock snapshot types for inspection and audit.

use crate::datastore::Datastore;
use crate::session::SessionRef;
use chrono::{DateTime, Duration, Utc};

/// Snapshot of one held lock, as returned by `list_locks` and `clear`.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The locked datastore.
    pub datastore: Datastore,

    /// The session holding the lock at snapshot time.
    pub holder: SessionRef,

    /// When the lock was taken.
    pub acquired_at: DateTime<Utc>,

    /// Whether the hold is older than the configured stale threshold.
    pub is_stale: bool,
}

impl LockInfo {
    /// How long the lock has been held.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (holder: {}, age: {}{})",
            self.datastore,
            self.holder,
            self.age_string(),
            if self.is_stale { ", STALE" } else { "" }
        )
    }
}
