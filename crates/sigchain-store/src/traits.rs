//! ChainStore trait: the abstract interface for chain persistence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lifecycle state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Open,
    Closed,
}

/// One persisted chain.
///
/// All three fields are opaque to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChain {
    /// The serialized team graph.
    pub serialized_team: Vec<u8>,
    /// The local user context (identity and secret keys).
    pub context: Vec<u8>,
    /// The local keyring of scope keys.
    pub team_keyring: Vec<u8>,
}

/// Async interface for chain persistence, keyed by team name.
///
/// Every data operation fails with [`StoreError::Closed`](crate::StoreError::Closed)
/// while the store is closed.
#[async_trait]
pub trait ChainStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    fn status(&self) -> StoreStatus;

    /// Open the store. Opening an open store does nothing.
    async fn open(&self) -> Result<()>;

    /// Close the store. Closing a closed store does nothing.
    async fn close(&self) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_chain(&self, name: &str) -> Result<Option<StoredChain>>;

    /// Insert or overwrite the record for `name`.
    async fn set_chain(&self, name: &str, chain: &StoredChain) -> Result<()>;

    /// Delete the record for `name`, if any.
    async fn delete_chain(&self, name: &str) -> Result<()>;

    /// Names of all stored chains, sorted.
    async fn list_chains(&self) -> Result<Vec<String>>;
}
