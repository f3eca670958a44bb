// # Account Store Implementations
//
// Built-in implementations of the AccountStore trait. Remote backends live
// in their own crates (see `ipguard-store-postgrest`).

pub mod file;
pub mod memory;

pub use file::{FileAccountStore, FileAccountStoreFactory};
pub use memory::{MemoryAccountStore, MemoryAccountStoreFactory};
