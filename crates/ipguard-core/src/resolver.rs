// # Address Resolver
//
// Produces the caller's public network address from an ordered list of
// lookup providers.
//
// ## Ordering
//
// Providers are tried strictly in list order. The first provider that
// returns an address wins and the remaining providers are never called.
// Results are never merged across providers.
//
// ## Failure Handling
//
// A failed provider (network error, bad status, malformed body, missing
// field, timeout) is logged and skipped. Each provider gets exactly one
// attempt per resolution. When every provider fails the outcome is
// `Resolution::Unavailable`, which callers treat as "resolution
// unavailable", never as an error.

use serde::Serialize;
use std::time::Duration;

use crate::NetworkAddress;
use crate::config::DEFAULT_LOOKUP_TIMEOUT_SECS;
use crate::traits::LookupProvider;

/// A provider that did not produce an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    /// Provider name
    pub provider: String,
    /// Why it failed
    pub reason: String,
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A provider reported an address
    Resolved {
        /// The reported address
        address: NetworkAddress,
        /// Name of the provider that reported it
        provider: String,
        /// Providers that failed before it
        failures: Vec<ProviderFailure>,
    },

    /// Every provider failed
    Unavailable {
        /// One entry per provider, in order
        failures: Vec<ProviderFailure>,
    },
}

impl Resolution {
    /// The resolved address, if any
    pub fn address(&self) -> Option<&NetworkAddress> {
        match self {
            Resolution::Resolved { address, .. } => Some(address),
            Resolution::Unavailable { .. } => None,
        }
    }

    /// Consume into the resolved address, if any
    pub fn into_address(self) -> Option<NetworkAddress> {
        match self {
            Resolution::Resolved { address, .. } => Some(address),
            Resolution::Unavailable { .. } => None,
        }
    }

    /// Name of the provider that answered, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { provider, .. } => Some(provider),
            Resolution::Unavailable { .. } => None,
        }
    }

    /// Providers that failed during this resolution
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Resolution::Resolved { failures, .. } | Resolution::Unavailable { failures } => {
                failures
            }
        }
    }

    /// Whether an address was resolved
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Resolves the caller's public address with sequential fallback
///
/// Stateless across calls: every [`resolve`](Self::resolve) starts again
/// from the first provider.
pub struct AddressResolver {
    /// Providers in resolution order
    providers: Vec<Box<dyn LookupProvider>>,

    /// Bound on a single provider call
    timeout: Duration,
}

impl AddressResolver {
    /// Create a resolver over `providers` with the default timeout
    pub fn new(providers: Vec<Box<dyn LookupProvider>>) -> Self {
        Self {
            providers,
            timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }

    /// Set the per-provider timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-provider timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Provider names, in resolution order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve the caller's public address
    ///
    /// Never fails; see [`Resolution`].
    pub async fn resolve(&self) -> Resolution {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();

            let reason = match tokio::time::timeout(self.timeout, provider.lookup()).await {
                Ok(Ok(address)) => {
                    tracing::info!(provider = name, address = %address, "Resolved public address");
                    return Resolution::Resolved {
                        address,
                        provider: name.to_string(),
                        failures,
                    };
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {:?}", self.timeout),
            };

            tracing::warn!(provider = name, %reason, "Address lookup failed, trying next provider");
            failures.push(ProviderFailure {
                provider: name.to_string(),
                reason,
            });
        }

        tracing::warn!(
            attempted = failures.len(),
            "All address lookup providers failed, resolution unavailable"
        );
        Resolution::Unavailable { failures }
    }

    /// Resolve and keep only the address
    pub async fn resolve_address(&self) -> Option<NetworkAddress> {
        self.resolve().await.into_address()
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("providers", &self.provider_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
