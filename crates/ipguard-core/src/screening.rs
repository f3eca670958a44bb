// # Signup Screening
//
// Sequences resolve → check → record for one registration and turns the
// outcome into a verdict.
//
// ## Verdicts
//
// - `Clear`: address resolved, fewer existing accounts than the policy limit
// - `Flagged`: address resolved, at or above the limit
// - `Unverified`: resolution unavailable, or the duplicate query failed
//
// A verdict is advice for the caller. The screener never blocks anything,
// and the address is recorded (when enabled) whatever the verdict, so later
// signups from the same address see this one.
//
// ## Race Window
//
// Check and record are separate store calls. Two signups from one address
// can both pass the check before either records. Only a uniqueness
// constraint in the backing store closes that window.

use serde::Serialize;
use std::sync::Arc;

use crate::checker::{DuplicateCheck, DuplicateChecker};
use crate::config::{GuardConfig, PolicyConfig};
use crate::recorder::AddressRecorder;
use crate::registry::Registry;
use crate::resolver::{AddressResolver, ProviderFailure, Resolution};
use crate::traits::AccountStore;
use crate::{NetworkAddress, Result};

/// Screening verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No duplicate signal
    Clear,
    /// Too many accounts already share the address
    Flagged,
    /// Detection could not run; treat as not blocked
    Unverified,
}

/// Everything learned while screening one registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningReport {
    /// Account being screened, if supplied
    pub account_id: Option<String>,
    /// Resolved address
    pub address: Option<NetworkAddress>,
    /// Provider that resolved it
    pub provider: Option<String>,
    /// Providers that failed along the way
    pub lookup_failures: Vec<ProviderFailure>,
    /// Duplicate query result (absent when resolution was unavailable)
    pub check: Option<DuplicateCheck>,
    /// Whether the address was written onto the account
    pub recorded: bool,
    /// Verdict
    pub verdict: Verdict,
}

/// Runs the detection pipeline for one registration at a time
///
/// Holds no per-registration state; one screener can serve concurrent
/// signups.
pub struct SignupScreener {
    resolver: AddressResolver,
    checker: DuplicateChecker,
    recorder: AddressRecorder,
    policy: PolicyConfig,
}

impl SignupScreener {
    /// Create a screener from its parts
    pub fn new(resolver: AddressResolver, store: Arc<dyn AccountStore>, policy: PolicyConfig) -> Self {
        Self {
            resolver,
            checker: DuplicateChecker::new(Arc::clone(&store)),
            recorder: AddressRecorder::new(store),
            policy,
        }
    }

    /// Build a screener from configuration through `registry`
    pub async fn from_config(config: &GuardConfig, registry: &Registry) -> Result<Self> {
        config.validate()?;

        let resolver = registry.create_resolver(&config.lookup)?;
        let store = registry.create_store(&config.store).await?;

        Ok(Self::new(resolver, store, config.policy.clone()))
    }

    /// The resolver used for step one
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// The duplicate checker used for step two
    pub fn checker(&self) -> &DuplicateChecker {
        &self.checker
    }

    /// The recorder used for step three
    pub fn recorder(&self) -> &AddressRecorder {
        &self.recorder
    }

    /// Screen one registration
    ///
    /// `account_id` is the freshly created account; without it nothing is
    /// recorded.
    pub async fn screen(&self, account_id: Option<&str>) -> ScreeningReport {
        let resolution = self.resolver.resolve().await;

        let (address, provider, lookup_failures) = match resolution {
            Resolution::Resolved {
                address,
                provider,
                failures,
            } => (address, provider, failures),
            Resolution::Unavailable { failures } => {
                tracing::warn!(account_id, "Screening unverified: no public address");
                return ScreeningReport {
                    account_id: account_id.map(str::to_string),
                    address: None,
                    provider: None,
                    lookup_failures: failures,
                    check: None,
                    recorded: false,
                    verdict: Verdict::Unverified,
                };
            }
        };

        let check = self.checker.count_accounts_by_address(&address).await;
        let verdict = self.verdict_for(&check);

        let recorded = match account_id {
            Some(id) if self.policy.record_address => {
                self.recorder.record_address(id, &address).await
            }
            _ => false,
        };

        tracing::info!(
            account_id,
            address = %address,
            existing = check.count,
            ?verdict,
            recorded,
            "Signup screened"
        );

        ScreeningReport {
            account_id: account_id.map(str::to_string),
            address: Some(address),
            provider: Some(provider),
            lookup_failures,
            check: Some(check),
            recorded,
            verdict,
        }
    }

    fn verdict_for(&self, check: &DuplicateCheck) -> Verdict {
        if check.degraded {
            Verdict::Unverified
        } else if check.count >= self.policy.max_accounts_per_address {
            Verdict::Flagged
        } else {
            Verdict::Clear
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAccountStore;
    use crate::traits::{AccountRecord, LookupProvider};

    struct Reports(&'static str);

    #[async_trait::async_trait]
    impl LookupProvider for Reports {
        async fn lookup(&self) -> Result<NetworkAddress> {
            NetworkAddress::new(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn screener(store: &MemoryAccountStore, policy: PolicyConfig) -> SignupScreener {
        SignupScreener::new(
            AddressResolver::new(vec![Box::new(Reports("198.51.100.9"))]),
            Arc::new(store.clone()),
            policy,
        )
    }

    #[tokio::test]
    async fn first_signup_is_clear_and_recorded() {
        let store = MemoryAccountStore::new();
        store.insert(AccountRecord::new("acc-1", "Ada")).await;

        let report = screener(&store, PolicyConfig::default())
            .screen(Some("acc-1"))
            .await;

        assert_eq!(report.verdict, Verdict::Clear);
        assert!(report.recorded);
        assert_eq!(report.provider.as_deref(), Some("fixed"));
        assert_eq!(report.check.map(|c| c.count), Some(0));
    }

    #[tokio::test]
    async fn second_signup_is_flagged() {
        let store = MemoryAccountStore::new();
        store.insert(AccountRecord::new("acc-1", "Ada")).await;
        store.insert(AccountRecord::new("acc-2", "Ada Again")).await;

        let screener = screener(&store, PolicyConfig::default());
        screener.screen(Some("acc-1")).await;
        let report = screener.screen(Some("acc-2")).await;

        assert_eq!(report.verdict, Verdict::Flagged);
        assert!(report.recorded);
    }

    #[tokio::test]
    async fn threshold_and_record_switch_follow_policy() {
        let store = MemoryAccountStore::new();
        store
            .insert(
                AccountRecord::new("acc-1", "Ada")
                    .with_address(NetworkAddress::new("198.51.100.9").unwrap()),
            )
            .await;
        store.insert(AccountRecord::new("acc-2", "Lin")).await;

        let policy = PolicyConfig {
            max_accounts_per_address: 2,
            record_address: false,
        };
        let report = screener(&store, policy).screen(Some("acc-2")).await;

        assert_eq!(report.verdict, Verdict::Clear);
        assert!(!report.recorded);
        assert!(store.get("acc-2").await.unwrap().registration_address.is_none());
    }

    #[tokio::test]
    async fn report_serializes_verdict_in_snake_case() {
        let store = MemoryAccountStore::new();
        let report = screener(&store, PolicyConfig::default()).screen(None).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "clear");
        assert_eq!(json["address"], "198.51.100.9");
        assert_eq!(json["recorded"], false);
    }
}
