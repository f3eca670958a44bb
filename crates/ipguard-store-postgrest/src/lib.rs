// # PostgREST Account Store
//
// This crate provides an AccountStore backed by a PostgREST endpoint, such
// as the REST interface of a Supabase project.
//
// ## Operations
//
// - Duplicate query:
//   `GET {base}/{table}?select=id,full_name,created_at&signup_ip=eq.{address}`
// - Address write:
//   `PATCH {base}/{table}?id=eq.{account_id}` with `{"signup_ip": address}`
//   and `Prefer: return=representation`; an empty representation means no
//   row matched and is reported as `Error::NotFound`
//
// ## Constraints
//
// - One HTTP request per store call; no retries, no caching
// - The API key never appears in logs, errors or `Debug` output
//
// ## API Reference
//
// - PostgREST: https://postgrest.org/en/stable/references/api.html

use async_trait::async_trait;
use ipguard_core::config::StoreConfig;
use ipguard_core::traits::{AccountMatch, AccountStore, AccountStoreFactory};
use ipguard_core::{Error, NetworkAddress, Registry, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

/// Default HTTP timeout for store requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns returned by the duplicate query
const MATCH_COLUMNS: &str = "id,full_name,created_at";

/// Address column
const ADDRESS_COLUMN: &str = "signup_ip";

/// PostgREST account store
pub struct PostgrestAccountStore {
    /// Table endpoint, `{base_url}/{table}`
    endpoint: String,

    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for PostgrestAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestAccountStore")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl PostgrestAccountStore {
    /// Create a store with the default timeout
    ///
    /// # Parameters
    ///
    /// - `base_url`: REST root (e.g., "https://project.supabase.co/rest/v1")
    /// - `api_key`: Key sent as `apikey` and bearer token
    /// - `table`: Accounts table
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        table: impl AsRef<str>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(base_url, api_key, table, client)
    }

    /// Create a store around an existing client
    pub fn with_client(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        table: impl AsRef<str>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("PostgREST API key cannot be empty"));
        }

        let base_url = base_url.as_ref().trim_end_matches('/');
        let table = table.as_ref().trim_matches('/');
        if base_url.is_empty() || table.is_empty() {
            return Err(Error::config("PostgREST base URL and table are required"));
        }

        Ok(Self {
            endpoint: format!("{}/{}", base_url, table),
            api_key,
            client,
        })
    }

    /// Table endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::provider("postgrest", format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(status_error(status, action, &detail))
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, action: &str, detail: &str) -> Error {
    let message = match status.as_u16() {
        401 | 403 => format!(
            "{}: authentication failed, check the API key and row-level policies. Status: {}",
            action, status
        ),
        404 => format!("{}: table not found. Status: {}", action, status),
        409 => format!("{}: conflict. Status: {}", action, status),
        429 => format!("{}: rate limit exceeded. Status: {}", action, status),
        500..=599 => format!("{}: server error (transient): {} - {}", action, status, detail),
        _ => format!("{}: unexpected response: {} - {}", action, status, detail),
    };
    Error::provider("postgrest", message)
}

#[async_trait]
impl AccountStore for PostgrestAccountStore {
    async fn find_by_address(&self, address: &NetworkAddress) -> Result<Vec<AccountMatch>> {
        let filter = format!("eq.{}", address);
        let request = self.authorized(
            self.client
                .get(&self.endpoint)
                .query(&[("select", MATCH_COLUMNS), (ADDRESS_COLUMN, filter.as_str())]),
        );

        let response = self.send(request, "Duplicate query").await?;
        let rows: Vec<AccountMatch> = response.json().await.map_err(|e| {
            Error::provider("postgrest", format!("Failed to parse query response: {}", e))
        })?;

        tracing::debug!(address = %address, rows = rows.len(), "PostgREST duplicate query");
        Ok(rows)
    }

    async fn set_address(&self, account_id: &str, address: &NetworkAddress) -> Result<()> {
        let filter = format!("eq.{}", account_id);
        let request = self.authorized(
            self.client
                .patch(&self.endpoint)
                .query(&[("id", filter.as_str())])
                .header("Prefer", "return=representation")
                .json(&json!({ ADDRESS_COLUMN: address })),
        );

        let response = self.send(request, "Address update").await?;
        let updated: Vec<Value> = response.json().await.map_err(|e| {
            Error::provider("postgrest", format!("Failed to parse update response: {}", e))
        })?;

        if updated.is_empty() {
            return Err(Error::not_found(format!("account {}", account_id)));
        }

        tracing::debug!(account_id, address = %address, "PostgREST address update");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgrest"
    }
}

/// Factory for the `postgrest` store type
pub struct PostgrestStoreFactory;

#[async_trait]
impl AccountStoreFactory for PostgrestStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn AccountStore>> {
        match config {
            StoreConfig::Postgrest {
                base_url,
                api_key,
                table,
            } => Ok(Box::new(PostgrestAccountStore::new(base_url, api_key.clone(), table)?)),
            _ => Err(Error::config("Invalid config for PostgREST account store")),
        }
    }
}

/// Register the PostgREST store with a registry
///
/// # Example
///
/// ```rust
/// use ipguard_core::Registry;
///
/// let registry = Registry::with_builtin_stores();
/// ipguard_store_postgrest::register(&registry);
/// assert!(registry.has_store("postgrest"));
/// ```
pub fn register(registry: &Registry) {
    registry.register_store("postgrest", Box::new(PostgrestStoreFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_table() {
        let store =
            PostgrestAccountStore::new("https://x.supabase.co/rest/v1/", "key", "accounts").unwrap();
        assert_eq!(store.endpoint(), "https://x.supabase.co/rest/v1/accounts");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(PostgrestAccountStore::new("https://x.supabase.co/rest/v1", "", "accounts").is_err());
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let store =
            PostgrestAccountStore::new("https://x.supabase.co/rest/v1", "service_role_secret", "accounts")
                .unwrap();

        let debug_str = format!("{:?}", store);
        assert!(!debug_str.contains("service_role_secret"));
        assert!(debug_str.contains("PostgrestAccountStore"));
    }

    #[test]
    fn test_status_mapping() {
        let err = status_error(StatusCode::UNAUTHORIZED, "Duplicate query", "");
        assert!(err.to_string().contains("authentication failed"));

        let err = status_error(StatusCode::BAD_GATEWAY, "Address update", "upstream down");
        assert!(err.to_string().contains("transient"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_factory_creation() {
        let factory = PostgrestStoreFactory;
        let config = StoreConfig::Postgrest {
            base_url: "https://x.supabase.co/rest/v1".to_string(),
            api_key: "key".to_string(),
            table: "accounts".to_string(),
        };

        let store = factory.create(&config).await.unwrap();
        assert_eq!(store.backend(), "postgrest");
        assert!(factory.create(&StoreConfig::Memory).await.is_err());
    }
}
