//! Address recorder
//!
//! Writes a resolved address onto one account. Any failure (unknown
//! account, store error) is logged and reported as `false`. No retries.

use std::sync::Arc;

use crate::NetworkAddress;
use crate::traits::AccountStore;

/// Persists registration addresses
#[derive(Clone)]
pub struct AddressRecorder {
    store: Arc<dyn AccountStore>,
}

impl AddressRecorder {
    /// Create a recorder over `store`
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Set the registration address of `account_id`
    ///
    /// Returns `true` only when the store acknowledged the write.
    pub async fn record_address(&self, account_id: &str, address: &NetworkAddress) -> bool {
        if account_id.trim().is_empty() {
            tracing::warn!(address = %address, "Refusing to record address for empty account id");
            return false;
        }

        match self.store.set_address(account_id, address).await {
            Ok(()) => {
                tracing::info!(account_id, address = %address, "Recorded registration address");
                true
            }
            Err(e) if e.is_not_found() => {
                tracing::error!(account_id, address = %address, "No account to record address on");
                false
            }
            Err(e) => {
                tracing::error!(
                    account_id,
                    address = %address,
                    backend = self.store.backend(),
                    error = %e,
                    "Failed to record registration address"
                );
                false
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
    async fn blank_account_id_is_rejected() {
        let store = MemoryAccountStore::new();
        store.insert(AccountRecord::new(" ", "Blank")).await;

        let recorder = AddressRecorder::new(Arc::new(store.clone()));
        let address = NetworkAddress::new("192.0.2.1").unwrap();

        assert!(!recorder.record_address(" ", &address).await);
        assert!(store.get(" ").await.unwrap().registration_address.is_none());
    }

    #[tokio::test]
    async fn unknown_account_is_false() {
        let recorder = AddressRecorder::new(Arc::new(MemoryAccountStore::new()));
        let address = NetworkAddress::new("192.0.2.1").unwrap();
        assert!(!recorder.record_address("missing", &address).await);
    }
}
