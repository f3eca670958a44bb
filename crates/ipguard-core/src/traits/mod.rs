//! Core traits for ipguard
//!
//! - [`LookupProvider`]: Report the caller's public address
//! - [`AccountStore`]: Query and update account registration addresses

pub mod account_store;
pub mod lookup_provider;

pub use account_store::{AccountMatch, AccountRecord, AccountStore, AccountStoreFactory};
pub use lookup_provider::{LookupProvider, LookupProviderFactory};
