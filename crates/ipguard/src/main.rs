// # ipguard - Signup Screening CLI
//
// Thin integration layer over ipguard-core. It:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers lookup providers and account stores
// 4. Screens one registration and prints the report as JSON on stdout
//
// Logs go to stderr so stdout stays machine-readable.
//
// ## Configuration
//
// ### Lookup
// - `IPGUARD_LOOKUP_URLS`: Comma-separated endpoints, tried in order
// - `IPGUARD_LOOKUP_FIELDS`: Comma-separated response fields (default `ip,IP`)
// - `IPGUARD_LOOKUP_TIMEOUT_SECS`: Per-provider timeout (default 8, max 60)
//
// ### Store
// - `IPGUARD_STORE_TYPE`: memory, file or postgrest (default file)
// - `IPGUARD_STORE_PATH`: Accounts file (for file)
// - `IPGUARD_POSTGREST_URL`: REST root (for postgrest)
// - `IPGUARD_POSTGREST_API_KEY`: API key (for postgrest)
// - `IPGUARD_POSTGREST_TABLE`: Accounts table (default accounts)
//
// ### Screening
// - `IPGUARD_ACCOUNT_ID`: Account to record the address on (optional)
// - `IPGUARD_MAX_ACCOUNTS_PER_ADDRESS`: Flag threshold (default 1)
// - `IPGUARD_RECORD_ADDRESS`: true/false (default true)
// - `IPGUARD_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export IPGUARD_STORE_TYPE=postgrest
// export IPGUARD_POSTGREST_URL=https://project.supabase.co/rest/v1
// export IPGUARD_POSTGREST_API_KEY=your_key
// export IPGUARD_ACCOUNT_ID=3f6c0a8e-...
//
// ipguard
// ```

use anyhow::Result;
use ipguard_core::config::{
    DEFAULT_ACCOUNTS_TABLE, DEFAULT_FIELD_CANDIDATES, DEFAULT_LOOKUP_ENDPOINTS,
    DEFAULT_LOOKUP_TIMEOUT_SECS, MAX_LOOKUP_TIMEOUT_SECS,
};
use ipguard_core::{
    GuardConfig, LookupConfig, LookupProviderConfig, PolicyConfig, Registry, SignupScreener,
    StoreConfig, Verdict,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes
///
/// - 0: Screened, not flagged (clear or unverified)
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
/// - 3: Screened and flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpguardExitCode {
    /// Screening finished without a duplicate signal
    Completed = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// Screening flagged the registration
    Flagged = 3,
}

impl From<IpguardExitCode> for ExitCode {
    fn from(code: IpguardExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl IpguardExitCode {
    /// Exit code for the outcome of `run`
    ///
    /// A core configuration error (unknown store type, unreadable accounts
    /// file) surfaces only when the screener is built, and still counts as
    /// a configuration error.
    fn for_outcome(outcome: &Result<Verdict>) -> Self {
        match outcome {
            Ok(Verdict::Flagged) => Self::Flagged,
            Ok(_) => Self::Completed,
            Err(e)
                if e.downcast_ref::<ipguard_core::Error>()
                    .is_some_and(ipguard_core::Error::is_config) =>
            {
                Self::ConfigError
            }
            Err(_) => Self::RuntimeError,
        }
    }
}

/// Application configuration
struct Config {
    lookup_urls: Vec<String>,
    lookup_fields: Vec<String>,
    lookup_timeout_secs: u64,
    store_type: String,
    store_path: Option<String>,
    postgrest_url: Option<String>,
    postgrest_api_key: Option<String>,
    postgrest_table: String,
    account_id: Option<String>,
    max_accounts_per_address: usize,
    record_address: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup_urls = var("IPGUARD_LOOKUP_URLS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| to_owned_list(DEFAULT_LOOKUP_ENDPOINTS));

        let lookup_fields = var("IPGUARD_LOOKUP_FIELDS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| to_owned_list(DEFAULT_FIELD_CANDIDATES));

        let lookup_timeout_secs = match var("IPGUARD_LOOKUP_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("IPGUARD_LOOKUP_TIMEOUT_SECS must be a number. Got: {}", v)
            })?,
            None => DEFAULT_LOOKUP_TIMEOUT_SECS,
        };

        let max_accounts_per_address = match var("IPGUARD_MAX_ACCOUNTS_PER_ADDRESS") {
            Some(v) => v.trim().parse::<usize>().map_err(|_| {
                anyhow::anyhow!("IPGUARD_MAX_ACCOUNTS_PER_ADDRESS must be a number. Got: {}", v)
            })?,
            None => 1,
        };

        let record_address = match var("IPGUARD_RECORD_ADDRESS") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                anyhow::anyhow!("IPGUARD_RECORD_ADDRESS must be true or false. Got: {}", v)
            })?,
            None => true,
        };

        Ok(Self {
            lookup_urls,
            lookup_fields,
            lookup_timeout_secs,
            store_type: var("IPGUARD_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            store_path: var("IPGUARD_STORE_PATH"),
            postgrest_url: var("IPGUARD_POSTGREST_URL"),
            postgrest_api_key: var("IPGUARD_POSTGREST_API_KEY"),
            postgrest_table: var("IPGUARD_POSTGREST_TABLE")
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_TABLE.to_string()),
            account_id: var("IPGUARD_ACCOUNT_ID").filter(|id| !id.trim().is_empty()),
            max_accounts_per_address,
            record_address,
            log_level: var("IPGUARD_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks the env-level rules (store-specific required variables, log
    /// level), then the assembled `GuardConfig`.
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" => {}
            "file" => {
                if self.store_path.as_ref().is_none_or(|p| p.is_empty()) {
                    anyhow::bail!(
                        "IPGUARD_STORE_PATH is required when IPGUARD_STORE_TYPE=file. \
                        Set it via: export IPGUARD_STORE_PATH=/var/lib/ipguard/accounts.json"
                    );
                }
            }
            "postgrest" => {
                if self.postgrest_url.as_ref().is_none_or(|u| u.is_empty()) {
                    anyhow::bail!(
                        "IPGUARD_POSTGREST_URL is required when IPGUARD_STORE_TYPE=postgrest"
                    );
                }
                if self.postgrest_api_key.as_ref().is_none_or(|k| k.is_empty()) {
                    anyhow::bail!(
                        "IPGUARD_POSTGREST_API_KEY is required when IPGUARD_STORE_TYPE=postgrest"
                    );
                }
            }
            other => anyhow::bail!(
                "IPGUARD_STORE_TYPE '{}' is not supported. \
                Supported types: memory, file, postgrest",
                other
            ),
        }

        if !(1..=MAX_LOOKUP_TIMEOUT_SECS).contains(&self.lookup_timeout_secs) {
            anyhow::bail!(
                "IPGUARD_LOOKUP_TIMEOUT_SECS must be between 1 and {} seconds. Got: {}",
                MAX_LOOKUP_TIMEOUT_SECS,
                self.lookup_timeout_secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IPGUARD_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.to_guard_config().validate()?;
        Ok(())
    }

    /// Assemble the core configuration
    fn to_guard_config(&self) -> GuardConfig {
        let providers = self
            .lookup_urls
            .iter()
            .map(|url| LookupProviderConfig::Http {
                url: url.clone(),
                fields: self.lookup_fields.clone(),
            })
            .collect();

        let store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
            "postgrest" => StoreConfig::Postgrest {
                base_url: self.postgrest_url.clone().unwrap_or_default(),
                api_key: self.postgrest_api_key.clone().unwrap_or_default(),
                table: self.postgrest_table.clone(),
            },
            _ => StoreConfig::Memory,
        };

        GuardConfig {
            lookup: LookupConfig {
                providers,
                timeout_secs: self.lookup_timeout_secs,
            },
            store,
            policy: PolicyConfig {
                max_accounts_per_address: self.max_accounts_per_address,
                record_address: self.record_address,
            },
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IpguardExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IpguardExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpguardExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpguardExitCode::RuntimeError.into();
        }
    };

    let outcome = rt.block_on(run(config));
    if let Err(e) = &outcome {
        error!("Screening error: {}", e);
    }

    IpguardExitCode::for_outcome(&outcome).into()
}

/// Build the screener and screen one registration
async fn run(config: Config) -> Result<Verdict> {
    let registry = Registry::with_builtin_stores();

    #[cfg(feature = "http")]
    ipguard_lookup_http::register(&registry);

    #[cfg(feature = "postgrest")]
    ipguard_store_postgrest::register(&registry);

    if config.store_type == "memory" {
        warn!("Memory store holds no prior accounts; every screening will be clear");
    }

    let guard = config.to_guard_config();
    let screener = SignupScreener::from_config(&guard, &registry).await?;

    info!(
        providers = ?screener.resolver().provider_names(),
        store = %config.store_type,
        account_id = config.account_id.as_deref(),
        "Screening registration"
    );

    let report = screener.screen(config.account_id.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(report.verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_need_a_store_path() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store_type, "file");
        assert_eq!(config.lookup_urls.len(), 3);
        assert!(config.validate().is_err());

        let config = load(&[("IPGUARD_STORE_PATH", "/tmp/accounts.json")]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn postgrest_requires_url_and_key() {
        let config = load(&[
            ("IPGUARD_STORE_TYPE", "postgrest"),
            ("IPGUARD_POSTGREST_URL", "https://x.supabase.co/rest/v1"),
        ])
        .unwrap();
        assert!(config.validate().is_err());

        let config = load(&[
            ("IPGUARD_STORE_TYPE", "postgrest"),
            ("IPGUARD_POSTGREST_URL", "https://x.supabase.co/rest/v1"),
            ("IPGUARD_POSTGREST_API_KEY", "anon"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_guard_config().store.type_name(), "postgrest");
    }

    #[test]
    fn lookup_lists_are_split_and_trimmed() {
        let config = load(&[
            ("IPGUARD_STORE_TYPE", "memory"),
            ("IPGUARD_LOOKUP_URLS", " https://a.example/ip , ,https://b.example/ip"),
            ("IPGUARD_LOOKUP_FIELDS", "address"),
        ])
        .unwrap();

        let guard = config.to_guard_config();
        assert_eq!(
            guard.lookup.providers,
            vec![
                LookupProviderConfig::Http {
                    url: "https://a.example/ip".to_string(),
                    fields: vec!["address".to_string()],
                },
                LookupProviderConfig::Http {
                    url: "https://b.example/ip".to_string(),
                    fields: vec!["address".to_string()],
                },
            ]
        );
    }

    #[test]
    fn rejects_bad_numbers_and_levels() {
        assert!(load(&[("IPGUARD_LOOKUP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("IPGUARD_RECORD_ADDRESS", "maybe")]).is_err());

        let config = load(&[
            ("IPGUARD_STORE_TYPE", "memory"),
            ("IPGUARD_LOOKUP_TIMEOUT_SECS", "0"),
        ])
        .unwrap();
        assert!(config.validate().is_err());

        let config = load(&[("IPGUARD_STORE_TYPE", "memory"), ("IPGUARD_LOG_LEVEL", "loud")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = load(&[
            ("IPGUARD_STORE_TYPE", "memory"),
            ("IPGUARD_MAX_ACCOUNTS_PER_ADDRESS", "0"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_account_id_is_ignored() {
        let config = load(&[("IPGUARD_ACCOUNT_ID", "  ")]).unwrap();
        assert_eq!(config.account_id, None);
    }

    #[test]
    fn unknown_store_type_is_rejected() {
        let config = load(&[("IPGUARD_STORE_TYPE", "redis")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn exit_codes_follow_outcome() {
        assert_eq!(
            IpguardExitCode::for_outcome(&Ok(Verdict::Flagged)),
            IpguardExitCode::Flagged
        );
        assert_eq!(
            IpguardExitCode::for_outcome(&Ok(Verdict::Unverified)),
            IpguardExitCode::Completed
        );
        assert_eq!(
            IpguardExitCode::for_outcome(&Err(ipguard_core::Error::config("bad store").into())),
            IpguardExitCode::ConfigError
        );
        assert_eq!(
            IpguardExitCode::for_outcome(&Err(anyhow::anyhow!("stdout closed"))),
            IpguardExitCode::RuntimeError
        );
    }

    #[tokio::test]
    async fn unreadable_accounts_file_exits_as_config_error() {
        let dir = env::temp_dir();
        let config = load(&[("IPGUARD_STORE_PATH", dir.to_str().unwrap())]).unwrap();
        assert!(config.validate().is_ok());

        let outcome = run(config).await;
        assert_eq!(
            IpguardExitCode::for_outcome(&outcome),
            IpguardExitCode::ConfigError
        );
    }
}
