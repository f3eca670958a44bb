// # Memory Account Store
//
// In-memory implementation of AccountStore.
//
// ## Purpose
//
// Backs tests, demos and embedded use where accounts live in the host
// process. Nothing survives a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::traits::{AccountMatch, AccountRecord, AccountStore, AccountStoreFactory};
use crate::{Error, NetworkAddress};

/// In-memory account store
///
/// Accounts are kept in a HashMap keyed by id behind a RwLock. Clones share
/// the same map.
///
/// # Example
///
/// ```rust,no_run
/// use ipguard_core::store::MemoryAccountStore;
/// use ipguard_core::traits::{AccountRecord, AccountStore};
/// use ipguard_core::NetworkAddress;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryAccountStore::new();
///     store.insert(AccountRecord::new("acc-1", "Ada")).await;
///
///     let address = NetworkAddress::new("203.0.113.7")?;
///     store.set_address("acc-1", &address).await?;
///
///     let matches = store.find_by_address(&address).await?;
///     assert_eq!(matches.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    inner: Arc<RwLock<HashMap<String, AccountRecord>>>,
}

impl MemoryAccountStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub async fn insert(&self, record: AccountRecord) {
        self.inner.write().await.insert(record.id.clone(), record);
    }

    /// Get an account by id
    pub async fn get(&self, account_id: &str) -> Option<AccountRecord> {
        self.inner.read().await.get(account_id).cloned()
    }

    /// Number of accounts
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no accounts
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Accounts registered under `address`, oldest first
pub(crate) fn matches_for<'a>(
    accounts: impl Iterator<Item = &'a AccountRecord>,
    address: &NetworkAddress,
) -> Vec<AccountMatch> {
    let mut matches: Vec<AccountMatch> = accounts
        .filter(|record| record.registration_address.as_ref() == Some(address))
        .map(AccountRecord::to_match)
        .collect();
    matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    matches
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_address(&self, address: &NetworkAddress) -> Result<Vec<AccountMatch>, Error> {
        let guard = self.inner.read().await;
        Ok(matches_for(guard.values(), address))
    }

    async fn set_address(&self, account_id: &str, address: &NetworkAddress) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let record = guard
            .get_mut(account_id)
            .ok_or_else(|| Error::not_found(format!("account {}", account_id)))?;
        record.registration_address = Some(address.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Factory for the `memory` store type
pub struct MemoryAccountStoreFactory;

#[async_trait]
impl AccountStoreFactory for MemoryAccountStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn AccountStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryAccountStore::new())),
            _ => Err(Error::config("Invalid config for memory account store")),
        }
    }
}
