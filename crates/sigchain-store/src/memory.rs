//! In-memory implementation of the ChainStore trait.
//!
//! Same semantics as SQLite, including the open/close lifecycle. Records
//! survive `close` but are lost when the store is dropped.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::traits::{ChainStore, StoreStatus, StoredChain};

/// In-memory store implementation. Starts closed.
pub struct MemoryChainStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    open: bool,
    chains: BTreeMap<String, StoredChain>,
}

impl MemoryChainStore {
    /// Create a new, empty, closed store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Read access, failing when closed.
    fn read_open(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        let inner = self.read()?;
        if !inner.open {
            return Err(StoreError::Closed);
        }
        Ok(inner)
    }

    /// Write access, failing when closed.
    fn write_open(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        let inner = self.write()?;
        if !inner.open {
            return Err(StoreError::Closed);
        }
        Ok(inner)
    }
}

impl Default for MemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainStore for MemoryChainStore {
    fn status(&self) -> StoreStatus {
        match self.read() {
            Ok(inner) if inner.open => StoreStatus::Open,
            _ => StoreStatus::Closed,
        }
    }

    async fn open(&self) -> Result<()> {
        self.write()?.open = true;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.write()?.open = false;
        Ok(())
    }

    async fn get_chain(&self, name: &str) -> Result<Option<StoredChain>> {
        Ok(self.read_open()?.chains.get(name).cloned())
    }

    async fn set_chain(&self, name: &str, chain: &StoredChain) -> Result<()> {
        self.write_open()?
            .chains
            .insert(name.to_string(), chain.clone());
        Ok(())
    }

    async fn delete_chain(&self, name: &str) -> Result<()> {
        self.write_open()?.chains.remove(name);
        Ok(())
    }

    async fn list_chains(&self) -> Result<Vec<String>> {
        Ok(self.read_open()?.chains.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tag: u8) -> StoredChain {
        StoredChain {
            serialized_team: vec![tag; 4],
            context: vec![tag; 2],
            team_keyring: vec![tag],
        }
    }

    #[tokio::test]
    async fn test_memory_store_starts_closed() {
        let store = MemoryChainStore::new();
        assert_eq!(store.status(), StoreStatus::Closed);
        assert!(matches!(
            store.get_chain("a").await,
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            store.set_chain("a", &record(1)).await,
            Err(StoreError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryChainStore::new();
        store.open().await.unwrap();
        store.open().await.unwrap();
        assert_eq!(store.status(), StoreStatus::Open);

        store.set_chain("b", &record(2)).await.unwrap();
        store.set_chain("a", &record(1)).await.unwrap();
        assert_eq!(store.get_chain("a").await.unwrap(), Some(record(1)));
        assert_eq!(store.list_chains().await.unwrap(), vec!["a", "b"]);

        // Overwrite.
        store.set_chain("a", &record(3)).await.unwrap();
        assert_eq!(store.get_chain("a").await.unwrap(), Some(record(3)));
    }

    #[tokio::test]
    async fn test_memory_store_delete_idempotent() {
        let store = MemoryChainStore::new();
        store.open().await.unwrap();
        store.set_chain("a", &record(1)).await.unwrap();

        store.delete_chain("a").await.unwrap();
        store.delete_chain("a").await.unwrap();
        assert_eq!(store.get_chain("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_survives_close() {
        let store = MemoryChainStore::new();
        store.open().await.unwrap();
        store.set_chain("a", &record(1)).await.unwrap();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert_eq!(store.status(), StoreStatus::Closed);

        store.open().await.unwrap();
        assert_eq!(store.get_chain("a").await.unwrap(), Some(record(1)));
    }
}
