//! `localStorage` persistence for the progress blob.

use courier_engine::ProgressStorage;
use thiserror::Error;

use crate::dom;

#[derive(Debug, Error)]
pub enum WebStorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Progress storage backed by the page's `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageProgress;

impl LocalStorageProgress {
    fn handle() -> Result<web_sys::Storage, WebStorageError> {
        dom::local_storage().map_err(|err| WebStorageError::Unavailable(dom::js_error_message(&err)))
    }
}

impl ProgressStorage for LocalStorageProgress {
    type Error = WebStorageError;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Self::handle()?
            .get_item(key)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))
    }

    fn save_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        Self::handle()?
            .set_item(key, blob)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))
    }

    fn clear(&self, key: &str) -> Result<(), Self::Error> {
        Self::handle()?
            .remove_item(key)
            .map_err(|err| WebStorageError::Storage(dom::js_error_message(&err)))
    }
}
