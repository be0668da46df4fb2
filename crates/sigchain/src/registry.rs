//! The process-wide service instance.
//!
//! Applications that need exactly one registry per process initialize it
//! once at startup and fetch it wherever needed. [`SigChainService`] itself
//! holds no global state; this module is the only place that does.

use std::sync::OnceLock;

use tracing::info;

use sigchain_store::SqliteChainStore;

use crate::error::{Result, SigChainError};
use crate::service::SigChainService;

static INSTANCE: OnceLock<SigChainService<SqliteChainStore>> = OnceLock::new();

/// Install `service` as the process-wide instance.
///
/// Fails with [`SigChainError::AlreadyInitialized`] on every call after the
/// first.
pub fn init(
    service: SigChainService<SqliteChainStore>,
) -> Result<&'static SigChainService<SqliteChainStore>> {
    INSTANCE
        .set(service)
        .map_err(|_| SigChainError::AlreadyInitialized)?;
    info!("initialized sigchain registry");
    instance()
}

/// The process-wide instance.
///
/// Fails with [`SigChainError::NotInitialized`] before [`init`].
pub fn instance() -> Result<&'static SigChainService<SqliteChainStore>> {
    INSTANCE.get().ok_or(SigChainError::NotInitialized)
}
