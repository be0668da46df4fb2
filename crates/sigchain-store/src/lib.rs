//! # Sigchain Store
//!
//! Durable storage for serialized team chains, keyed by team name.
//!
//! ## Overview
//!
//! The [`ChainStore`] trait keeps the application layer storage-agnostic.
//! The primary implementation is [`SqliteChainStore`]; [`MemoryChainStore`]
//! has the same semantics and is used in tests.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - The async trait for all storage operations
//! - [`StoredChain`] - The persisted record: graph, local context and keyring
//! - [`StoreStatus`] - Whether a store is open for data operations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sigchain_store::{ChainStore, SqliteChainStore};
//!
//! async fn example() {
//!     let store = SqliteChainStore::new("chains.db");
//!     store.open().await.unwrap();
//!     let names = store.list_chains().await.unwrap();
//!     # let _ = names;
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Explicit lifecycle**: data operations fail with [`StoreError::Closed`]
//!   until `open` is called. `open` and `close` are idempotent.
//! - **Opaque records**: the three byte fields of a [`StoredChain`] are never
//!   interpreted by the store.
//! - **Idempotent deletes**: deleting an absent record is not an error.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryChainStore;
pub use sqlite::SqliteChainStore;
pub use traits::{ChainStore, StoreStatus, StoredChain};
