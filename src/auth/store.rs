//! Credential storage tiers
//!
//! A credential lives in exactly one of two places after a successful login:
//! the durable tier (survives restarts for a few days, "remember me") or the
//! session tier (gone when the process exits).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::credential::Credential;
use crate::error::ClientError;

/// One persistence tier for the bearer credential.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, ClientError>;
    fn save(&self, credential: &Credential) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// In-memory store; lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// The session-scoped tier.
pub type SessionStore = MemoryStore;

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    token: Credential,
    expires_at: DateTime<Utc>,
}

/// Durable tier backed by a JSON file. Entries carry their own store expiry,
/// independent of the token's claims.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lifetime: Duration,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, lifetime_days: i64) -> Self {
        Self {
            path: path.into(),
            lifetime: Duration::days(lifetime_days),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entry(&self) -> Result<Option<StoredEntry>, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClientError::Storage(format!("read {}: {e}", self.path.display()))),
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!("Discarding unreadable credential file {}: {}", self.path.display(), e);
                self.clear()?;
                Ok(None)
            }
        }
    }
}

impl TokenStore for FileStore {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        let Some(entry) = self.read_entry()? else {
            return Ok(None);
        };
        if entry.expires_at <= Utc::now() {
            tracing::debug!("Durable credential past its store expiry, removing");
            self.clear()?;
            return Ok(None);
        }
        Ok(Some(entry.token))
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let entry = StoredEntry {
            token: credential.clone(),
            expires_at: Utc::now() + self.lifetime,
        };
        let body = serde_json::to_string(&entry).map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(&self.path, body)
            .map_err(|e| ClientError::Storage(format!("write {}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!("remove {}: {e}", self.path.display()))),
        }
    }
}

/// Which tier a credential was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Durable,
    Session,
}

/// Both tiers together. All credential persistence goes through here.
#[derive(Clone)]
pub struct CredentialVault {
    durable: Arc<dyn TokenStore>,
    session: Arc<dyn TokenStore>,
}

impl CredentialVault {
    pub fn new(durable: Arc<dyn TokenStore>, session: Arc<dyn TokenStore>) -> Self {
        Self { durable, session }
    }

    /// Vault with both tiers in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SessionStore::new()))
    }

    /// Stores the credential in exactly one tier, clearing the other.
    pub fn persist(&self, credential: &Credential, remember: bool) -> Result<Tier, ClientError> {
        self.wipe()?;
        if remember {
            self.durable.save(credential)?;
            Ok(Tier::Durable)
        } else {
            self.session.save(credential)?;
            Ok(Tier::Session)
        }
    }

    /// Durable tier first, session tier as fallback.
    pub fn load(&self) -> Result<Option<(Credential, Tier)>, ClientError> {
        if let Some(credential) = self.durable.load()? {
            return Ok(Some((credential, Tier::Durable)));
        }
        Ok(self.session.load()?.map(|c| (c, Tier::Session)))
    }

    pub fn durable(&self) -> Result<Option<Credential>, ClientError> {
        self.durable.load()
    }

    pub fn session(&self) -> Result<Option<Credential>, ClientError> {
        self.session.load()
    }

    /// Whether the durable tier currently holds a credential. Read errors count as absent.
    pub fn has_durable(&self) -> bool {
        matches!(self.durable.load(), Ok(Some(_)))
    }

    /// Clears both tiers. Both are attempted even if the first fails.
    pub fn wipe(&self) -> Result<(), ClientError> {
        let durable = self.durable.clear();
        let session = self.session.clear();
        durable.and(session)
    }
}
