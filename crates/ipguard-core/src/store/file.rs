// # File Account Store
//
// JSON-file implementation of AccountStore for single-host deployments.
//
// ## Durability
//
// - Every mutation rewrites the whole file: write to `.tmp`, then rename
// - The previous file is copied to `.backup` before each rename
// - A main file that fails to parse is replaced from `.backup`
// - If the backup is unusable too, the store starts empty
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "accounts": {
//     "acc-1": {
//       "id": "acc-1",
//       "full_name": "Ada",
//       "created_at": "2025-01-09T12:00:00Z",
//       "signup_ip": "203.0.113.7"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::store::memory::matches_for;
use crate::traits::{AccountMatch, AccountRecord, AccountStore, AccountStoreFactory};
use crate::{Error, NetworkAddress};

/// Accounts file format version
const ACCOUNTS_FILE_VERSION: &str = "1.0";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct AccountsFile {
    version: String,
    accounts: HashMap<String, AccountRecord>,
}

/// Why a file could not be loaded
enum LoadFailure {
    /// Readable but not a valid accounts file
    Corrupt(Error),
    /// Could not be read at all
    Unreadable(Error),
}

/// File-backed account store
///
/// All accounts are held in memory and written through on every mutation.
/// Writes are serialized by the inner lock, which is held across the disk
/// write so the file always reflects a single, complete state.
#[derive(Debug)]
pub struct FileAccountStore {
    path: PathBuf,
    accounts: RwLock<HashMap<String, AccountRecord>>,
}

impl FileAccountStore {
    /// Open (or create) the accounts file at `path`
    ///
    /// Parent directories are created as needed. A corrupt file is
    /// recovered from its backup; an unreadable file is a configuration
    /// error.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create accounts directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let accounts = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    /// Path of the accounts file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace an account and persist
    pub async fn insert(&self, record: AccountRecord) -> Result<(), Error> {
        let mut guard = self.accounts.write().await;
        guard.insert(record.id.clone(), record);
        self.persist(&guard).await
    }

    /// Get an account by id
    pub async fn get(&self, account_id: &str) -> Option<AccountRecord> {
        self.accounts.read().await.get(account_id).cloned()
    }

    /// Number of accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether the store holds no accounts
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, AccountRecord>, Error> {
        let failure = match Self::load(path).await {
            Ok(accounts) => {
                tracing::debug!(path = %path.display(), accounts = accounts.len(), "Loaded accounts file");
                return Ok(accounts);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(e)) => e,
        };

        tracing::warn!(
            path = %path.display(),
            error = %failure,
            "Accounts file is corrupt, attempting recovery from backup"
        );

        let backup = Self::backup_path(path);
        if !backup.exists() {
            tracing::warn!("No accounts backup found, starting empty");
            return Ok(HashMap::new());
        }

        match Self::load(&backup).await {
            Ok(accounts) => {
                tracing::info!(accounts = accounts.len(), "Recovered accounts from backup");
                if let Err(e) = fs::copy(&backup, path).await {
                    tracing::error!(error = %e, "Failed to restore accounts file from backup");
                }
                Ok(accounts)
            }
            Err(LoadFailure::Corrupt(e)) | Err(LoadFailure::Unreadable(e)) => {
                tracing::error!(error = %e, "Accounts backup unusable, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, AccountRecord>, LoadFailure> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::config(format!(
                "Failed to read accounts file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: AccountsFile = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(Error::store(format!(
                "Failed to parse accounts file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != ACCOUNTS_FILE_VERSION {
            tracing::warn!(
                expected = ACCOUNTS_FILE_VERSION,
                found = %file.version,
                "Accounts file version mismatch, loading anyway"
            );
        }

        Ok(file.accounts)
    }

    /// Atomically replace the file with `accounts`
    async fn persist(&self, accounts: &HashMap<String, AccountRecord>) -> Result<(), Error> {
        let file = AccountsFile {
            version: ACCOUNTS_FILE_VERSION.to_string(),
            accounts: accounts.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let temp = self.temp_path();
        let mut handle = fs::File::create(&temp).await.map_err(|e| {
            Error::store(format!("Failed to create {}: {}", temp.display(), e))
        })?;
        handle
            .write_all(json.as_bytes())
            .await
            .map_err(|e| Error::store(format!("Failed to write {}: {}", temp.display(), e)))?;
        handle
            .flush()
            .await
            .map_err(|e| Error::store(format!("Failed to flush {}: {}", temp.display(), e)))?;
        drop(handle);

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!(error = %e, "Failed to back up accounts file");
        }

        fs::rename(&temp, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), "Accounts file written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        path.with_extension("backup")
    }
}

#[async_trait]
impl AccountStore for FileAccountStore {
    async fn find_by_address(&self, address: &NetworkAddress) -> Result<Vec<AccountMatch>, Error> {
        let guard = self.accounts.read().await;
        Ok(matches_for(guard.values(), address))
    }

    async fn set_address(&self, account_id: &str, address: &NetworkAddress) -> Result<(), Error> {
        let mut guard = self.accounts.write().await;
        let record = guard
            .get_mut(account_id)
            .ok_or_else(|| Error::not_found(format!("account {}", account_id)))?;
        let previous = record.registration_address.replace(address.clone());

        if let Err(e) = self.persist(&guard).await {
            // Keep memory consistent with disk.
            if let Some(record) = guard.get_mut(account_id) {
                record.registration_address = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

/// Factory for the `file` store type
pub struct FileAccountStoreFactory;

#[async_trait]
impl AccountStoreFactory for FileAccountStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn AccountStore>, Error> {
        match config {
            StoreConfig::File { path } => Ok(Box::new(FileAccountStore::open(path).await?)),
            _ => Err(Error::config("Invalid config for file account store")),
        }
    }
}
