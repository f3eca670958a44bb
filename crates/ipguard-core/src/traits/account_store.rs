// # Account Store Trait
//
// Defines the two persistence operations the detection flow needs:
//
// - `find_by_address`: read-only select of accounts registered under an address
// - `set_address`: update one account's registration address
//
// ## Implementations
//
// - In-memory: `MemoryAccountStore`
// - JSON file: `FileAccountStore`
// - PostgREST: `ipguard-store-postgrest` crate
//
// Field names on the wire follow the accounts table: `full_name` and
// `signup_ip`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::NetworkAddress;

/// Stored account identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Unique account identifier
    pub id: String,
    /// Display name
    #[serde(rename = "full_name")]
    pub display_name: String,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Address the account registered from, unset until recorded
    #[serde(rename = "signup_ip", default)]
    pub registration_address: Option<NetworkAddress>,
}

impl AccountRecord {
    /// Create a record created now, with no registration address
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
            registration_address: None,
        }
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the registration address
    pub fn with_address(mut self, address: NetworkAddress) -> Self {
        self.registration_address = Some(address);
        self
    }

    /// The projection returned by duplicate queries
    pub fn to_match(&self) -> AccountMatch {
        AccountMatch {
            id: self.id.clone(),
            display_name: Some(self.display_name.clone()),
            created_at: self.created_at,
        }
    }
}

/// Minimal account fields returned by [`AccountStore::find_by_address`]
///
/// Only `id` matters for counting; the name may be null or absent in the
/// backing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMatch {
    /// Unique account identifier
    pub id: String,
    /// Display name, if the account has one
    #[serde(rename = "full_name", default)]
    pub display_name: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

/// Trait for account store implementations
///
/// The store is an external, already-synchronized collaborator. Callers
/// issue independent reads and writes and never wrap them in a transaction,
/// so check-then-record is advisory. A uniqueness guarantee, if wanted,
/// belongs in the backing database as a constraint.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find all accounts registered under `address`
    ///
    /// Must not mutate any record.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<AccountMatch>)`: Matching accounts (possibly empty)
    /// - `Err(Error)`: Store unavailable or query rejected
    async fn find_by_address(
        &self,
        address: &NetworkAddress,
    ) -> Result<Vec<AccountMatch>, crate::Error>;

    /// Set the registration address of account `account_id`
    ///
    /// Overwrites any previous address.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Write acknowledged
    /// - `Err(Error::NotFound)`: No account with that id
    /// - `Err(Error)`: Store error
    async fn set_address(
        &self,
        account_id: &str,
        address: &NetworkAddress,
    ) -> Result<(), crate::Error>;

    /// Backend name used in logs
    fn backend(&self) -> &'static str;
}

/// Helper trait for constructing account stores from configuration
#[async_trait]
pub trait AccountStoreFactory: Send + Sync {
    /// Create an AccountStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn AccountStore>, crate::Error>;
}
