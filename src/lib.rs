//! dslock: exclusive lock manager for named configuration datastores.
//!
//! Arbitrates concurrent lock claims over a fixed set of configuration
//! datastores (`running`, `startup`, `candidate`) on behalf of many client
//! sessions. Exactly one session may hold a datastore at a time; every other
//! attempt fails immediately with a conflict naming the holder; there is no
//! wait queue and no re-entrancy. Each local decision is reconciled with an
//! external authoritative backend that can refuse a lock this process cannot
//! see (e.g. one taken by another process at the storage layer).
//!
//! # Usage
//!
//! The server constructs one [`locks::LockManager`] and shares it by
//! reference with every request handler. The backend session stays owned by
//! the caller and is passed in per call:
//!
//! ```
//! use dslock::backend::MemoryBackend;
//! use dslock::datastore::Datastore;
//! use dslock::locks::LockManager;
//! use dslock::session::SessionHandle;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), dslock::error::LockError> {
//! let manager = LockManager::new();
//! let backend = MemoryBackend::new();
//! let session = Arc::new(SessionHandle::new(1, "admin"));
//!
//! manager.acquire(Datastore::Running, &session, &backend)?;
//! manager.release(Datastore::Running, &session, &backend)?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod datastore;
pub mod error;
pub mod events;
pub mod locks;
pub mod session;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use datastore::Datastore;
pub use error::{LockError, Result};
pub use locks::{LockInfo, LockManager};
pub use session::{SessionHandle, SessionRef};
