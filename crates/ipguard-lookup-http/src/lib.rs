// # HTTP Lookup Provider
//
// This crate provides the HTTP/JSON lookup provider for ipguard.
//
// ## Protocol
//
// One `GET` per lookup with `Accept: application/json`. The body must be a
// JSON object; the address is the first configured field (default `ip`,
// then `IP`) holding a non-empty string.
//
// ## Failure Handling
//
// Every failure (connect error, timeout, non-2xx status, body that is not
// JSON, no usable field) is returned as `Error::Provider` naming the
// endpoint. Fallback to the next endpoint is the resolver's job; this
// provider never retries.

use ipguard_core::config::{LookupProviderConfig, default_field_candidates};
use ipguard_core::traits::{LookupProvider, LookupProviderFactory};
use ipguard_core::{Error, NetworkAddress, Registry, Result};

use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for a lookup request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// JSON lookup provider
#[derive(Debug, Clone)]
pub struct HttpLookupProvider {
    /// Endpoint URL
    url: String,

    /// Response fields tried, in order
    fields: Vec<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpLookupProvider {
    /// Create a provider with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: Endpoint (e.g., "https://api.ipify.org?format=json")
    /// - `fields`: Response fields tried in order (e.g., `["ip", "IP"]`)
    pub fn new(url: impl Into<String>, fields: Vec<String>) -> Result<Self> {
        Self::with_timeout(url, fields, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a provider with a custom request timeout
    pub fn with_timeout(
        url: impl Into<String>,
        fields: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ipguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(url, fields, client)
    }

    /// Create a provider around an existing client
    ///
    /// The client should carry its own timeout.
    pub fn with_client(
        url: impl Into<String>,
        fields: Vec<String>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::config("Lookup URL cannot be empty"));
        }
        if fields.is_empty() {
            return Err(Error::config(format!(
                "Lookup provider {} needs at least one response field",
                url
            )));
        }

        Ok(Self {
            url,
            fields,
            client,
        })
    }

    /// Response fields tried, in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Pick the address out of a lookup response body
///
/// Returns the first field in `fields` whose value is a non-empty string.
/// Non-string values are skipped.
pub fn extract_address(body: &Value, fields: &[String]) -> Option<NetworkAddress> {
    fields
        .iter()
        .filter_map(|field| body.get(field)?.as_str())
        .find_map(|candidate| NetworkAddress::new(candidate).ok())
}

#[async_trait::async_trait]
impl LookupProvider for HttpLookupProvider {
    async fn lookup(&self) -> Result<NetworkAddress> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| Error::provider(&self.url, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::provider(&self.url, format!("HTTP error: {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::provider(&self.url, format!("Malformed response body: {}", e)))?;

        let address = extract_address(&body, &self.fields).ok_or_else(|| {
            Error::provider(
                &self.url,
                format!("No address in response fields {:?}", self.fields),
            )
        })?;

        tracing::debug!(url = %self.url, address = %address, "Lookup succeeded");
        Ok(address)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Factory for creating HTTP lookup providers
pub struct HttpLookupFactory;

impl LookupProviderFactory for HttpLookupFactory {
    fn create(
        &self,
        config: &LookupProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LookupProvider>> {
        match config {
            LookupProviderConfig::Http { url, fields } => {
                let fields = if fields.is_empty() {
                    default_field_candidates()
                } else {
                    fields.clone()
                };
                Ok(Box::new(HttpLookupProvider::with_timeout(
                    url.clone(),
                    fields,
                    timeout,
                )?))
            }
            _ => Err(Error::config("Invalid config for HTTP lookup provider")),
        }
    }
}

/// Register the HTTP lookup provider with a registry
pub fn register(registry: &Registry) {
    registry.register_lookup("http", Box::new(HttpLookupFactory));
}
