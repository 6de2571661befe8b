//! Temp-file-backed [`Store`] construction for cross-crate tests.
//!
//! `ricochet_store`'s own tests use `Store::open_in_memory`, which is fine
//! for one connection, but the listener and poller crates need a store that
//! behaves like the one the CLI actually opens — a real file, openable from
//! more than one pooled connection at once.

use crate::error::Result;
use ricochet_store::Store;
use tempfile::TempDir;

/// A `Store` backed by a file in a temp directory that is deleted when this
/// value drops.
pub struct TestStore {
    store: Store,
    _dir: TempDir,
}

impl TestStore {
    /// Creates a fresh, fully-migrated temp-file store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TestSupportError`] if the temp directory or
    /// the underlying database cannot be created.
    pub async fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("ricochet-test.db");
        let store = Store::open(&path).await?;
        Ok(Self { store, _dir: dir })
    }

    /// Borrows the underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}
