//! Configuration types for ipguard
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Lookup endpoints tried, in order, when none are configured
pub const DEFAULT_LOOKUP_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org?format=json",
    "https://api.seeip.org/jsonip",
    "https://jsonip.com",
];

/// Response fields searched, in order, for the address
pub const DEFAULT_FIELD_CANDIDATES: &[&str] = &["ip", "IP"];

/// Default per-provider timeout (seconds)
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 8;

/// Upper bound on the per-provider timeout (seconds)
pub const MAX_LOOKUP_TIMEOUT_SECS: u64 = 60;

/// Default accounts table name
pub const DEFAULT_ACCOUNTS_TABLE: &str = "accounts";

/// Main ipguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Address lookup configuration
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Account store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Screening policy
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl GuardConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.lookup.validate()?;
        self.store.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}

/// Address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Providers, tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<LookupProviderConfig>,

    /// Per-provider timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.providers.is_empty() {
            return Err(crate::Error::config("At least one lookup provider is required"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_LOOKUP_TIMEOUT_SECS {
            return Err(crate::Error::config(format!(
                "Lookup timeout must be between 1 and {} seconds, got {}",
                MAX_LOOKUP_TIMEOUT_SECS, self.timeout_secs
            )));
        }
        for provider in &self.providers {
            provider.validate()?;
        }
        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Lookup provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupProviderConfig {
    /// HTTP endpoint returning a JSON object
    Http {
        /// Endpoint URL
        url: String,
        /// Response fields searched for the address, in order
        #[serde(default = "default_field_candidates")]
        fields: Vec<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl LookupProviderConfig {
    /// HTTP provider with the default field candidates
    pub fn http(url: impl Into<String>) -> Self {
        LookupProviderConfig::Http {
            url: url.into(),
            fields: default_field_candidates(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            LookupProviderConfig::Http { url, fields } => {
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Lookup URL must use HTTP or HTTPS scheme, got: {}",
                        url
                    )));
                }
                if fields.is_empty() || fields.iter().any(|f| f.is_empty()) {
                    return Err(crate::Error::config(format!(
                        "Lookup provider {} needs at least one non-empty field name",
                        url
                    )));
                }
                Ok(())
            }
            LookupProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom lookup provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom lookup provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Registry key for this provider
    pub fn type_name(&self) -> &str {
        match self {
            LookupProviderConfig::Http { .. } => "http",
            LookupProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Account store configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// JSON file store
    File {
        /// Path to the accounts file
        path: String,
    },

    /// PostgREST endpoint (e.g. a Supabase project)
    Postgrest {
        /// REST root, e.g. `https://project.supabase.co/rest/v1`
        base_url: String,
        /// API key, sent as `apikey` and bearer token
        api_key: String,
        /// Accounts table
        #[serde(default = "default_table")]
        table: String,
    },

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Postgrest {
                base_url,
                api_key,
                table,
            } => {
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "PostgREST base URL must use HTTP or HTTPS scheme, got: {}",
                        base_url
                    )));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("PostgREST API key cannot be empty"));
                }
                if table.is_empty() {
                    return Err(crate::Error::config("PostgREST table cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Registry key for this store
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Postgrest { .. } => "postgrest",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Screening policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Existing accounts under one address at which a signup is flagged
    #[serde(default = "default_max_accounts_per_address")]
    pub max_accounts_per_address: usize,

    /// Write the resolved address onto the screened account
    #[serde(default = "default_record_address")]
    pub record_address: bool,
}

impl PolicyConfig {
    /// Validate the policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_accounts_per_address == 0 {
            return Err(crate::Error::config(
                "max_accounts_per_address must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_accounts_per_address: default_max_accounts_per_address(),
            record_address: default_record_address(),
        }
    }
}

fn default_providers() -> Vec<LookupProviderConfig> {
    DEFAULT_LOOKUP_ENDPOINTS
        .iter()
        .map(|url| LookupProviderConfig::http(*url))
        .collect()
}

/// Default field candidates as owned strings
pub fn default_field_candidates() -> Vec<String> {
    DEFAULT_FIELD_CANDIDATES.iter().map(|f| f.to_string()).collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_SECS
}

fn default_table() -> String {
    DEFAULT_ACCOUNTS_TABLE.to_string()
}

fn default_max_accounts_per_address() -> usize {
    1
}

fn default_record_address() -> bool {
    true
}
