// # Lookup Provider Trait
//
// Defines the interface for services that report the caller's public
// network address.
//
// ## Implementations
//
// - HTTP/JSON endpoints: `ipguard-lookup-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ipguard_core::LookupProvider;
//
// let provider = /* LookupProvider implementation */;
// let address = provider.lookup().await?;
// println!("{} reports {}", provider.name(), address);
// ```

use async_trait::async_trait;
use std::time::Duration;

use crate::NetworkAddress;

/// Trait for lookup provider implementations
///
/// A provider performs exactly one request per [`lookup`](Self::lookup)
/// call. Retries, fallback to other providers and the overall timeout are
/// owned by [`AddressResolver`](crate::AddressResolver).
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Ask the provider for the caller's public address
    ///
    /// # Returns
    ///
    /// - `Ok(NetworkAddress)`: The reported address
    /// - `Err(Error)`: Network failure, non-success status, malformed body,
    ///   or no usable address field
    async fn lookup(&self) -> Result<NetworkAddress, crate::Error>;

    /// Name used in logs and failure reports (usually the endpoint URL)
    fn name(&self) -> &str;
}

/// Helper trait for constructing lookup providers from configuration
pub trait LookupProviderFactory: Send + Sync {
    /// Create a LookupProvider instance from configuration
    ///
    /// `timeout` is the configured per-provider budget. Providers with their
    /// own transport timeout must use it, so the resolver's limit is the one
    /// that applies.
    fn create(
        &self,
        config: &crate::config::LookupProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LookupProvider>, crate::Error>;
}
