//! In-memory progress storage for tests and headless runs.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::ProgressStorage;
use crate::error::StorageError;

/// Shared in-memory blob store. Clones see the same contents, so a test can
/// keep a handle while a session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail, as a full or disabled store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, blob: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.to_string(), blob.into());
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = StorageError;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn save_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(StorageError::WriteFailed(format!("quota exceeded for {key}")));
        }
        self.insert_raw(key, blob);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.save_blob("rcp_state", "{}").unwrap();
        assert_eq!(handle.load_blob("rcp_state").unwrap().as_deref(), Some("{}"));
        handle.clear("rcp_state").unwrap();
        assert!(storage.raw("rcp_state").is_none());
    }

    #[test]
    fn failing_writes_leave_contents_untouched() {
        let storage = MemoryStorage::new();
        storage.insert_raw("k", "old");
        storage.set_fail_writes(true);
        let err = storage.save_blob("k", "new").unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed(_)));
        assert_eq!(storage.raw("k").as_deref(), Some("old"));
    }
}
