// # ipguard-core
//
// Core library for IP-based duplicate-account detection.
//
// ## Architecture Overview
//
// A registration is screened in three steps, each owned by one component:
// - **AddressResolver**: asks an ordered list of `LookupProvider`s for the
//   caller's public address, first success wins
// - **DuplicateChecker**: counts accounts already registered under that address
// - **AddressRecorder**: writes the address back onto the new account
//
// `SignupScreener` sequences the three and applies a flagging policy.
// Lookup providers and account stores are plugins created through the
// `Registry` from configuration.
//
// ## Failure Policy
//
// Detection is a fraud signal, not a registration gate. None of the three
// components return errors: an unavailable lookup becomes
// `Resolution::Unavailable`, a failed query becomes an empty, degraded
// `DuplicateCheck`, and a failed write becomes `false`. Every degradation is
// logged through `tracing`.

pub mod address;
pub mod checker;
pub mod config;
pub mod error;
pub mod recorder;
pub mod registry;
pub mod resolver;
pub mod screening;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use address::NetworkAddress;
pub use checker::{DuplicateCheck, DuplicateChecker};
pub use config::{GuardConfig, LookupConfig, LookupProviderConfig, PolicyConfig, StoreConfig};
pub use error::{Error, Result};
pub use recorder::AddressRecorder;
pub use registry::Registry;
pub use resolver::{AddressResolver, ProviderFailure, Resolution};
pub use screening::{ScreeningReport, SignupScreener, Verdict};
pub use store::{FileAccountStore, MemoryAccountStore};
pub use traits::{AccountMatch, AccountRecord, AccountStore, LookupProvider};
