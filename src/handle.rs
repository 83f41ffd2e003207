//! Shared ownership of the open container file.
//!
//! Every object derived from one open file (the file itself, its groups
//! and variables) holds an `Arc` to the same [`FileHandle`]. The handle
//! releases the underlying store exactly once: either on the first
//! explicit [`FileHandle::close`], which invalidates every other owner, or
//! implicitly when the last owner drops it.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::engine::{Store, StoreError};
use crate::util::{Error, Result};

/// Close-once wrapper around the storage engine, shared across the object
/// graph of one open file.
#[derive(Debug)]
pub(crate) struct FileHandle {
    inner: Mutex<Option<Store>>,
}

impl FileHandle {
    pub fn new(store: Store) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Some(store)),
        })
    }

    /// Run an operation against the open store, wrapping engine failures
    /// with `context`. Fails with [`Error::ResourceClosed`] once the
    /// handle has been closed.
    pub fn with<R>(
        &self,
        context: &str,
        op: impl FnOnce(&mut Store) -> std::result::Result<R, StoreError>,
    ) -> Result<R> {
        let mut guard = self.inner.lock();
        let store = guard.as_mut().ok_or(Error::ResourceClosed)?;
        op(store).map_err(|e| Error::from_store(context, e))
    }

    /// Force define mode. Already being in define mode is not an error;
    /// any other rejection is a mode-transition failure.
    pub fn ensure_define(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let store = guard.as_mut().ok_or(Error::ResourceClosed)?;
        match store.redef() {
            Ok(()) | Err(StoreError::AlreadyInDefineMode) => Ok(()),
            Err(e) => Err(Error::Mode {
                context: "error entering define mode".to_string(),
                source: e,
            }),
        }
    }

    /// Force data mode, committing pending definitions. Already being in
    /// data mode is not an error.
    pub fn ensure_data(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let store = guard.as_mut().ok_or(Error::ResourceClosed)?;
        match store.enddef() {
            Ok(()) | Err(StoreError::AlreadyInDataMode) => Ok(()),
            Err(e) => Err(Error::Mode {
                context: "error leaving define mode".to_string(),
                source: e,
            }),
        }
    }

    /// Release the store. Only the first call performs the release and
    /// reports its outcome; later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        match guard.take() {
            Some(mut store) => store
                .close()
                .map_err(|e| Error::from_store("error closing file", e)),
            None => Ok(()),
        }
    }

    /// True until the handle is explicitly closed.
    pub fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (tempfile::TempDir, Arc<FileHandle>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::create(&dir.path().join("handle.ndf"), true).expect("create");
        (dir, FileHandle::new(store))
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, handle) = handle();
        assert!(handle.is_open());
        handle.close().unwrap();
        assert!(!handle.is_open());
        // second close is a no-op, not an error
        handle.close().unwrap();
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (_dir, handle) = handle();
        handle.close().unwrap();
        let result = handle.with("error syncing file", |s| s.sync());
        assert!(matches!(result, Err(Error::ResourceClosed)));
        assert!(matches!(handle.ensure_define(), Err(Error::ResourceClosed)));
        assert!(matches!(handle.ensure_data(), Err(Error::ResourceClosed)));
    }

    #[test]
    fn test_mode_reassertion_absorbed() {
        let (_dir, handle) = handle();
        // a created store is already defining: both calls succeed
        handle.ensure_define().unwrap();
        handle.ensure_define().unwrap();
        handle.ensure_data().unwrap();
        handle.ensure_data().unwrap();
        handle.ensure_define().unwrap();
    }

    #[test]
    fn test_shared_owners_see_close() {
        let (_dir, handle) = handle();
        let other = handle.clone();
        handle.close().unwrap();
        assert!(matches!(
            other.with("error syncing file", |s| s.sync()),
            Err(Error::ResourceClosed)
        ));
    }
}
