//! SigChainService: the registry of named chains.
//!
//! The service holds every chain loaded in memory, keyed by team name, plus
//! an optional active chain, and moves chains to and from a [`ChainStore`].
//!
//! The chain map and the active name live behind a single lock. Checking
//! for a duplicate name and inserting happen in one critical section, so at
//! most one registration per name can succeed even when callers race on
//! different threads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use sigchain_store::{ChainStore, StoreError, StoreStatus};

use crate::chain::SigChain;
use crate::error::{Result, SigChainError};

/// Configuration for the service.
#[derive(Debug, Clone)]
pub struct SigChainConfig {
    /// Open a closed store before loading or saving instead of failing.
    pub open_store_on_demand: bool,
    /// Longest accepted team name, in bytes.
    pub max_name_len: usize,
}

impl Default for SigChainConfig {
    fn default() -> Self {
        Self {
            open_store_on_demand: true,
            max_name_len: 255,
        }
    }
}

impl SigChainConfig {
    pub fn open_store_on_demand(mut self, enabled: bool) -> Self {
        self.open_store_on_demand = enabled;
        self
    }

    pub fn max_name_len(mut self, len: usize) -> Self {
        self.max_name_len = len;
        self
    }
}

#[derive(Default)]
struct Registry {
    chains: HashMap<String, Arc<SigChain>>,
    /// Always a key of `chains` when set.
    active: Option<String>,
}

/// The registry of named chains.
pub struct SigChainService<S: ChainStore> {
    store: S,
    config: SigChainConfig,
    registry: Mutex<Registry>,
}

impl<S: ChainStore> SigChainService<S> {
    pub fn new(store: S, config: SigChainConfig) -> Self {
        Self {
            store,
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SigChainConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new team with a fresh user and register it.
    pub fn create_chain(
        &self,
        team_name: &str,
        user_name: &str,
        set_active: bool,
    ) -> Result<Arc<SigChain>> {
        self.validate_name(team_name)?;
        if self.has_chain(team_name) {
            return Err(SigChainError::DuplicateChain(team_name.to_string()));
        }

        let chain = Arc::new(SigChain::create(team_name, user_name)?);
        self.add_chain(chain.clone(), set_active)?;
        Ok(chain)
    }

    /// Register an existing chain under its name.
    ///
    /// Returns whether the chain became active.
    pub fn add_chain(&self, chain: Arc<SigChain>, set_active: bool) -> Result<bool> {
        let name = chain.name().to_string();
        let mut registry = self.registry();
        if registry.chains.contains_key(&name) {
            return Err(SigChainError::DuplicateChain(name));
        }
        registry.chains.insert(name.clone(), chain);
        info!(team_name = %name, set_active, "registered chain");

        if set_active {
            registry.active = Some(name);
        }
        Ok(set_active)
    }

    /// Remove a chain from memory and, if `also_from_store`, from the store.
    ///
    /// Deleting an unknown chain is not an error. The store record is
    /// deleted first; if that fails the registry is left untouched.
    pub async fn delete_chain(&self, team_name: &str, also_from_store: bool) -> Result<()> {
        if also_from_store {
            self.ensure_store_open().await?;
            self.store.delete_chain(team_name).await?;
        }

        let mut registry = self.registry();
        if registry.chains.remove(team_name).is_some() {
            info!(team_name, also_from_store, "deleted chain");
        }
        if registry.active.as_deref() == Some(team_name) {
            registry.active = None;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup & activation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_chain(&self, team_name: &str) -> Result<Arc<SigChain>> {
        self.registry()
            .chains
            .get(team_name)
            .cloned()
            .ok_or_else(|| SigChainError::NotFound(team_name.to_string()))
    }

    pub fn has_chain(&self, team_name: &str) -> bool {
        self.registry().chains.contains_key(team_name)
    }

    /// Names of all registered chains, sorted.
    pub fn chain_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry().chains.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn set_active_chain(&self, team_name: &str) -> Result<Arc<SigChain>> {
        let mut registry = self.registry();
        let chain = registry
            .chains
            .get(team_name)
            .cloned()
            .ok_or_else(|| SigChainError::NotFound(team_name.to_string()))?;
        registry.active = Some(team_name.to_string());
        debug!(team_name, "activated chain");
        Ok(chain)
    }

    pub fn get_active_chain(&self) -> Result<Arc<SigChain>> {
        let registry = self.registry();
        let name = registry.active.as_ref().ok_or(SigChainError::NoActiveChain)?;
        registry
            .chains
            .get(name)
            .cloned()
            .ok_or_else(|| SigChainError::NotFound(name.clone()))
    }

    pub fn active_chain_name(&self) -> Option<String> {
        self.registry().active.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a chain from the store and register it.
    pub async fn load_chain(&self, team_name: &str, set_active: bool) -> Result<Arc<SigChain>> {
        self.validate_name(team_name)?;
        if self.has_chain(team_name) {
            return Err(SigChainError::DuplicateChain(team_name.to_string()));
        }

        self.ensure_store_open().await?;
        info!(team_name, "loading chain");
        let stored = self
            .store
            .get_chain(team_name)
            .await?
            .ok_or_else(|| SigChainError::NotFound(team_name.to_string()))?;

        let chain = Arc::new(SigChain::from_stored(&stored)?);
        if chain.name() != team_name {
            return Err(SigChainError::InvalidName {
                name: team_name.to_string(),
                reason: format!("stored record holds team {:?}", chain.name()),
            });
        }
        self.add_chain(chain.clone(), set_active)?;
        Ok(chain)
    }

    /// Write a registered chain's current state to the store.
    pub async fn save_chain(&self, team_name: &str) -> Result<()> {
        let chain = self.get_chain(team_name)?;
        let stored = chain.serialize()?;

        self.ensure_store_open().await?;
        self.store.set_chain(team_name, &stored).await?;
        info!(team_name, "saved chain");
        Ok(())
    }

    async fn ensure_store_open(&self) -> Result<()> {
        if self.store.status() == StoreStatus::Open {
            return Ok(());
        }
        if !self.config.open_store_on_demand {
            return Err(StoreError::Closed.into());
        }
        debug!("opening chain store on demand");
        self.store.open().await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Registry updates are single inserts or removals, so a poisoned lock
    /// still guards a consistent map.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        validate_name(name, self.config.max_name_len)
    }
}

/// Check that `name` can be used as a chain name.
pub fn validate_name(name: &str, max_len: usize) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty".to_string())
    } else if name.trim() != name {
        Some("name has leading or trailing whitespace".to_string())
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters".to_string())
    } else if name.len() > max_len {
        Some(format!("name is longer than {} bytes", max_len))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SigChainError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
