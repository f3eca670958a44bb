//! Minimal embedding example for ipguard-core
//!
//! A signup handler that screens each new account in-process: a custom
//! lookup provider stands in for the request's client address and a
//! memory store stands in for the accounts table.

use ipguard_core::traits::{AccountRecord, LookupProvider};
use ipguard_core::{
    AddressResolver, MemoryAccountStore, NetworkAddress, PolicyConfig, Result, SignupScreener,
    Verdict,
};
use std::sync::Arc;

/// Reports the address the web framework saw on the incoming request
struct RequestAddress(NetworkAddress);

#[async_trait::async_trait]
impl LookupProvider for RequestAddress {
    async fn lookup(&self) -> Result<NetworkAddress> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "request"
    }
}

async fn handle_signup(
    store: &MemoryAccountStore,
    id: &str,
    name: &str,
    client: &str,
) -> Result<Verdict> {
    store.insert(AccountRecord::new(id, name)).await;

    let screener = SignupScreener::new(
        AddressResolver::new(vec![Box::new(RequestAddress(NetworkAddress::new(client)?))]),
        Arc::new(store.clone()),
        PolicyConfig::default(),
    );

    let report = screener.screen(Some(id)).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.verdict)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let store = MemoryAccountStore::new();

    let first = handle_signup(&store, "acc-1", "Ada", "203.0.113.7").await?;
    let second = handle_signup(&store, "acc-2", "Ada (again)", "203.0.113.7").await?;
    let third = handle_signup(&store, "acc-3", "Lin", "198.51.100.20").await?;

    tracing::info!(?first, ?second, ?third, "Demo finished");
    assert_eq!(first, Verdict::Clear);
    assert_eq!(second, Verdict::Flagged);
    assert_eq!(third, Verdict::Clear);
    Ok(())
}
