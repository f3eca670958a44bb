//! Shared test utilities for contract tests
//!
//! Scripted lookup providers and stores that let tests control exactly
//! which step succeeds, fails or hangs, and count how often each was called.

#![allow(dead_code)]

use ipguard_core::traits::{AccountMatch, AccountStore, LookupProvider};
use ipguard_core::{AccountRecord, Error, NetworkAddress, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted provider does when asked
#[derive(Debug, Clone)]
pub enum Script {
    /// Report this address
    Answer(&'static str),
    /// Fail with this message
    Fail(&'static str),
    /// Never answer (until the resolver times out)
    Hang,
}

/// A LookupProvider that follows a script and counts calls
pub struct ScriptedLookup {
    name: String,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLookup {
    /// Create the provider plus a handle on its call counter
    pub fn new(name: &str, script: Script) -> (Self, CallCounter) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name: name.to_string(),
                script,
                calls: Arc::clone(&calls),
            },
            CallCounter(calls),
        )
    }
}

#[async_trait::async_trait]
impl LookupProvider for ScriptedLookup {
    async fn lookup(&self) -> Result<NetworkAddress> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Answer(address) => NetworkAddress::new(address),
            Script::Fail(message) => Err(Error::provider(&self.name, *message)),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::provider(&self.name, "unreachable"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Read-only view of a scripted provider's call count
#[derive(Clone)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Build a provider list from scripts, returning counters in the same order
pub fn scripted(scripts: &[Script]) -> (Vec<Box<dyn LookupProvider>>, Vec<CallCounter>) {
    let mut providers: Vec<Box<dyn LookupProvider>> = Vec::new();
    let mut counters = Vec::new();
    for (i, script) in scripts.iter().enumerate() {
        let (provider, counter) = ScriptedLookup::new(&format!("provider-{}", i + 1), script.clone());
        providers.push(Box::new(provider));
        counters.push(counter);
    }
    (providers, counters)
}

/// An AccountStore whose every call fails, counting attempts
#[derive(Default)]
pub struct UnavailableStore {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl UnavailableStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AccountStore for UnavailableStore {
    async fn find_by_address(&self, _address: &NetworkAddress) -> Result<Vec<AccountMatch>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(Error::store("connection refused"))
    }

    async fn set_address(&self, _account_id: &str, _address: &NetworkAddress) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(Error::store("connection refused"))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

/// Shorthand for a valid address
pub fn addr(text: &str) -> NetworkAddress {
    NetworkAddress::new(text).expect("valid test address")
}

/// An account with no registration address yet
pub fn account(id: &str) -> AccountRecord {
    AccountRecord::new(id, format!("User {}", id))
}
