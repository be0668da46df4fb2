//! # Sigchain
//!
//! Named team sigchains for an application: a registry that creates,
//! activates, persists, loads and deletes chains, and the domain services
//! that operate on each chain.
//!
//! ## Overview
//!
//! - [`SigChainService`] - Registry of chains keyed by team name, with at
//!   most one active chain, backed by a [`ChainStore`](store::ChainStore)
//! - [`SigChain`] - One team chain bound to the local user
//! - [`services`] - Users, devices, roles, channels, invites and crypto
//! - [`registry`] - Optional process-wide instance
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sigchain::{SigChainConfig, SigChainService};
//! use sigchain::store::SqliteChainStore;
//!
//! async fn example() {
//!     let service = SigChainService::new(
//!         SqliteChainStore::new("chains.db"),
//!         SigChainConfig::default(),
//!     );
//!
//!     let chain = service.create_chain("my-team", "alice", true).unwrap();
//!     chain.channels().create_private_channel("general", &chain.context()).unwrap();
//!
//!     service.save_chain("my-team").await.unwrap();
//! }
//! ```
//!
//! ## Shared handles
//!
//! `get_chain` and `get_active_chain` return the same `Arc<SigChain>` the
//! registry holds. Changes made through any holder are visible to all.
//!
//! ## Re-exports
//!
//! - `sigchain::core` - Signed links and the team graph
//! - `sigchain::team` - Team state, roles, invitations and keys
//! - `sigchain::store` - Storage abstraction and SQLite

pub mod chain;
pub mod error;
pub mod registry;
pub mod service;
pub mod services;

// Re-export component crates
pub use sigchain_core as core;
pub use sigchain_store as store;
pub use sigchain_team as team;

// Re-export main types for convenience
pub use chain::SigChain;
pub use error::{Result, SigChainError};
pub use service::{validate_name, SigChainConfig, SigChainService};
pub use services::{
    Channel, ChannelService, CryptoService, DeviceService, EncryptedAndSignedPayload,
    EncryptedPayload, EncryptionScope, EncryptionScopeType, InviteService, ProspectiveUser,
    RoleService, RoleView, UserService,
};

// Re-export commonly used team types
pub use sigchain_core::UserId;
pub use sigchain_team::{
    Keyring, LocalUserContext, Member, MemberSearchOptions, ProofOfInvitation, Role, ADMIN,
    MEMBER,
};
