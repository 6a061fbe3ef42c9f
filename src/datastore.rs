//! Datastore identifiers.
//!
//! The set of lockable configuration datastores is fixed: `running`,
//! `startup`, and `candidate`. Callers resolve the name from their own request
//! layer and hand the manager a `Datastore`; a name outside the set fails at
//! parse time with [`LockError::UnknownDatastore`], which is a protocol error
//! rather than a locking conflict.

use crate::error::LockError;
use std::fmt;
use std::str::FromStr;

/// One of the fixed configuration datastores a session can lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datastore {
    /// The active configuration.
    Running,
    /// The configuration loaded at startup.
    Startup,
    /// The working configuration edited before commit.
    Candidate,
}

impl Datastore {
    /// All datastores, in a fixed order usable for table slot layout.
    pub const ALL: [Datastore; 3] = [Datastore::Running, Datastore::Startup, Datastore::Candidate];

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Datastore::Running => "running",
            Datastore::Startup => "startup",
            Datastore::Candidate => "candidate",
        }
    }

    /// Slot position inside the lock table.
    pub(crate) fn index(self) -> usize {
        match self {
            Datastore::Running => 0,
            Datastore::Startup => 1,
            Datastore::Candidate => 2,
        }
    }
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datastore {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Datastore::Running),
            "startup" => Ok(Datastore::Startup),
            "candidate" => Ok(Datastore::Candidate),
            other => Err(LockError::UnknownDatastore(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_parse() {
        assert_eq!("running".parse::<Datastore>().unwrap(), Datastore::Running);
        assert_eq!("startup".parse::<Datastore>().unwrap(), Datastore::Startup);
        assert_eq!(
            "candidate".parse::<Datastore>().unwrap(),
            Datastore::Candidate
        );
    }

    #[test]
    fn unknown_name_is_a_protocol_error() {
        let err = "runing".parse::<Datastore>().unwrap_err();
        assert!(matches!(err, LockError::UnknownDatastore(_)));
        assert!(err.to_string().contains("runing"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        // The protocol delivers the element name verbatim; "Running" is not it.
        assert!("Running".parse::<Datastore>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for ds in Datastore::ALL {
            assert_eq!(ds.to_string().parse::<Datastore>().unwrap(), ds);
        }
    }

    #[test]
    fn slot_indices_are_distinct_and_dense() {
        let mut seen = [false; Datastore::ALL.len()];
        for ds in Datastore::ALL {
            assert!(!seen[ds.index()]);
            seen[ds.index()] = true;
        }
    }
}
