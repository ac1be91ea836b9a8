//! Wallet batch persistence
//!
//! Generated batches are written as timestamped JSON files in a storage
//! directory, with a `latest` pointer file naming the most recent batch.
//! Files hold private keys, so they are created with 0600 permissions on Unix.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::types::{WalletRecord, WalletStatus};

const LATEST_POINTER: &str = "latest";

/// Persistence collaborator for wallet batches
pub trait WalletStore {
    /// Persist a batch, returning its identifier
    fn save(&self, wallets: &[WalletRecord]) -> Result<String>;

    /// Load a batch by identifier, or the most recent one
    fn load(&self, id: Option<&str>) -> Result<Vec<WalletRecord>>;
}

/// On-disk batch file structure
#[derive(Debug, Serialize, Deserialize)]
struct WalletBatch {
    #[serde(default = "default_version")]
    version: String,
    wallets: Vec<WalletRecord>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// JSON file store rooted at a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn batch_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(Error::Storage(format!("Invalid batch identifier: {}", id)));
        }
        Ok(self.dir.join(id))
    }

    fn latest_id(&self) -> Result<Option<String>> {
        let pointer = self.dir.join(LATEST_POINTER);
        if !pointer.exists() {
            return Ok(None);
        }
        let id = std::fs::read_to_string(&pointer)?;
        let id = id.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }
}

impl WalletStore for JsonFileStore {
    fn save(&self, wallets: &[WalletRecord]) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;

        let mut stamp = Utc::now().timestamp_millis();
        let mut id = format!("{}.json", stamp);
        while self.dir.join(&id).exists() {
            stamp += 1;
            id = format!("{}.json", stamp);
        }

        let batch = WalletBatch {
            version: default_version(),
            wallets: wallets.to_vec(),
        };
        let json = serde_json::to_string_pretty(&batch)?;

        let path = self.batch_path(&id)?;
        std::fs::write(&path, json)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        std::fs::write(self.dir.join(LATEST_POINTER), &id)?;

        info!("Saved {} wallets to {}", wallets.len(), path.display());
        Ok(id)
    }

    fn load(&self, id: Option<&str>) -> Result<Vec<WalletRecord>> {
        let id = match id {
            Some(id) => id.to_string(),
            None => match self.latest_id()? {
                Some(id) => id,
                None => {
                    warn!("No saved wallet batch in {}", self.dir.display());
                    return Ok(Vec::new());
                }
            },
        };

        let path = self.batch_path(&id)?;
        debug!("Loading wallets from: {:?}", path);

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        let batch: WalletBatch = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", path.display(), e)))?;

        let wallets: Vec<WalletRecord> = batch
            .wallets
            .into_iter()
            .map(|mut w| {
                w.status = WalletStatus::Idle;
                w
            })
            .collect();

        info!("Loaded {} wallets from {}", wallets.len(), id);
        Ok(wallets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::keys;
    use crate::wallet::types::AmountRange;
    use tempfile::tempdir;

    #[test]
    fn test_load_without_batches_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(None).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_batch() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let mut wallets = keys::generate(3, AmountRange::new(0.001, 0.003)).unwrap();
        wallets[1].funded_amount = 0.5;
        wallets[2].status = WalletStatus::Error;

        let id = store.save(&wallets).unwrap();
        let loaded = store.load(Some(&id)).unwrap();

        assert_eq!(loaded.len(), 3);
        for (a, b) in wallets.iter().zip(&loaded) {
            assert_eq!(a.address, b.address);
            assert_eq!(a.private_key, b.private_key);
            assert_eq!(a.mnemonic, b.mnemonic);
            assert_eq!(a.assigned_amount(), b.assigned_amount());
            assert_eq!(a.funded_amount, b.funded_amount);
            assert_eq!(b.status, WalletStatus::Idle);
        }
    }

    #[test]
    fn test_load_latest_batch() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let range = AmountRange::new(0.001, 0.003);

        let first = keys::generate(1, range).unwrap();
        let second = keys::generate(2, range).unwrap();
        let first_id = store.save(&first).unwrap();
        let second_id = store.save(&second).unwrap();
        assert_ne!(first_id, second_id);

        let latest = store.load(None).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].address, second[0].address);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.load(Some("../secrets.json")),
            Err(Error::Storage(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let wallets = keys::generate(1, AmountRange::new(0.001, 0.003)).unwrap();
        let id = store.save(&wallets).unwrap();

        let mode = std::fs::metadata(dir.path().join(id)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
