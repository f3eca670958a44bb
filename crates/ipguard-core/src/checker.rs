//! Duplicate checker
//!
//! Counts the accounts already registered under a network address. The
//! query is read-only. Store failures fail open: they are logged and
//! reported as zero matches with `degraded` set, so an outage never blocks
//! a signup.

use serde::Serialize;
use std::sync::Arc;

use crate::NetworkAddress;
use crate::traits::{AccountMatch, AccountStore};

/// Result of a duplicate query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCheck {
    /// Whether any account shares the address (`count > 0`)
    pub exists: bool,
    /// Number of matching accounts
    pub count: usize,
    /// The matching accounts
    pub accounts: Vec<AccountMatch>,
    /// Set when the store query failed and the zero count is a default
    pub degraded: bool,
}

impl DuplicateCheck {
    fn from_matches(accounts: Vec<AccountMatch>) -> Self {
        Self {
            exists: !accounts.is_empty(),
            count: accounts.len(),
            accounts,
            degraded: false,
        }
    }

    fn fail_open() -> Self {
        Self {
            exists: false,
            count: 0,
            accounts: Vec::new(),
            degraded: true,
        }
    }
}

/// Counts accounts by registration address
#[derive(Clone)]
pub struct DuplicateChecker {
    store: Arc<dyn AccountStore>,
}

impl DuplicateChecker {
    /// Create a checker over `store`
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Count accounts registered under `address`
    ///
    /// Never fails; a store error yields `{ exists: false, count: 0 }` with
    /// `degraded` set.
    pub async fn count_accounts_by_address(&self, address: &NetworkAddress) -> DuplicateCheck {
        match self.store.find_by_address(address).await {
            Ok(accounts) => {
                let check = DuplicateCheck::from_matches(accounts);
                tracing::debug!(
                    address = %address,
                    count = check.count,
                    backend = self.store.backend(),
                    "Duplicate query completed"
                );
                check
            }
            Err(e) => {
                tracing::error!(
                    address = %address,
                    backend = self.store.backend(),
                    error = %e,
                    "Duplicate query failed, treating as no matches"
                );
                DuplicateCheck::fail_open()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAccountStore;
    use crate::traits::AccountRecord;

    #[tokio::test]
    async fn exists_tracks_count() {
        let store = MemoryAccountStore::new();
        let address = NetworkAddress::new("203.0.113.50").unwrap();
        store
            .insert(AccountRecord::new("acc-1", "Ada").with_address(address.clone()))
            .await;

        let checker = DuplicateChecker::new(Arc::new(store));
        let check = checker.count_accounts_by_address(&address).await;

        assert!(check.exists);
        assert_eq!(check.count, 1);
        assert_eq!(check.accounts[0].id, "acc-1");
        assert!(!check.degraded);
    }
}
