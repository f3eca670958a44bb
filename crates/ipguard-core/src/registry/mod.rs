//! Plugin-based registry
//!
//! The registry maps type names from configuration to factories, so lookup
//! providers and account stores can be added by other crates without the
//! core knowing about them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ipguard_core::{GuardConfig, Registry};
//!
//! let registry = Registry::with_builtin_stores();
//! ipguard_lookup_http::register(&registry);
//!
//! let config = GuardConfig::default();
//! let resolver = registry.create_resolver(&config.lookup)?;
//! let store = registry.create_store(&config.store).await?;
//! ```
//!
//! ## Registration
//!
//! Implementation crates expose a `register()` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &Registry) {
//!     registry.register_lookup("http", Box::new(HttpLookupFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::{LookupConfig, LookupProviderConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::resolver::AddressResolver;
use crate::store::{FileAccountStoreFactory, MemoryAccountStoreFactory};
use crate::traits::{AccountStore, AccountStoreFactory, LookupProvider, LookupProviderFactory};

/// Registry of lookup provider and account store factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: concurrent reads, exclusive writes.
/// No lock is held across an `.await`.
#[derive(Default)]
pub struct Registry {
    /// Registered lookup provider factories
    lookups: RwLock<HashMap<String, Box<dyn LookupProviderFactory>>>,

    /// Registered account store factories
    stores: RwLock<HashMap<String, Arc<dyn AccountStoreFactory>>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryAccountStoreFactory));
        registry.register_store("file", Box::new(FileAccountStoreFactory));
        registry
    }

    /// Register a lookup provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "http")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_lookup(&self, name: impl Into<String>, factory: Box<dyn LookupProviderFactory>) {
        let mut lookups = self.lookups.write().unwrap_or_else(PoisonError::into_inner);
        lookups.insert(name.into(), factory);
    }

    /// Register an account store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "memory", "postgrest")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn AccountStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create one lookup provider from configuration
    ///
    /// `timeout` is handed to the factory as the provider's request budget.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn LookupProvider>)`: Created provider
    /// - `Err(Error)`: Type not registered or creation failed
    pub fn create_lookup(
        &self,
        config: &LookupProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LookupProvider>> {
        let lookup_type = config.type_name();
        let lookups = self.lookups.read().unwrap_or_else(PoisonError::into_inner);

        let factory = lookups
            .get(lookup_type)
            .ok_or_else(|| Error::config(format!("Unknown lookup provider type: {}", lookup_type)))?;

        factory.create(config, timeout)
    }

    /// Create a resolver over every configured provider, in order
    pub fn create_resolver(&self, config: &LookupConfig) -> Result<AddressResolver> {
        config.validate()?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let providers = config
            .providers
            .iter()
            .map(|provider| self.create_lookup(provider, timeout))
            .collect::<Result<Vec<_>>>()?;

        Ok(AddressResolver::new(providers).with_timeout(timeout))
    }

    /// Create an account store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn AccountStore>)`: Created store, shareable between checker and recorder
    /// - `Err(Error)`: Type not registered or creation failed
    pub async fn create_store(&self, config: &StoreConfig) -> Result<Arc<dyn AccountStore>> {
        config.validate()?;

        let store_type = config.type_name();
        let factory = {
            let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
            stores
                .get(store_type)
                .ok_or_else(|| Error::config(format!("Unknown account store type: {}", store_type)))?
                .clone()
        };

        let store = factory.create(config).await?;
        tracing::debug!(backend = store.backend(), "Account store created");
        Ok(Arc::from(store))
    }

    /// Registered lookup provider type names
    pub fn list_lookups(&self) -> Vec<String> {
        let lookups = self.lookups.read().unwrap_or_else(PoisonError::into_inner);
        lookups.keys().cloned().collect()
    }

    /// Registered account store type names
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.keys().cloned().collect()
    }

    /// Check if a lookup provider type is registered
    pub fn has_lookup(&self, name: &str) -> bool {
        let lookups = self.lookups.read().unwrap_or_else(PoisonError::into_inner);
        lookups.contains_key(name)
    }

    /// Check if an account store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
