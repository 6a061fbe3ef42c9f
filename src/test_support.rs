use crate::backend::MemoryBackend;
use crate::locks::LockManager;
use crate::session::{SessionHandle, SessionRef};
use std::sync::Arc;

pub(crate) fn session(id: u32, username: &str) -> SessionRef {
    Arc::new(SessionHandle::new(id, username))
}

pub(crate) fn manager_and_backend() -> (LockManager, MemoryBackend) {
    (LockManager::new(), MemoryBackend::new())
}
