//! File-backed credential store.
//!
//! All slots live in one JSON object on disk. Every read goes to the file so a
//! freshly started process sees what the previous one persisted. Writes replace
//! the file atomically (write to a sibling temp file, then rename).

use crate::{CredentialAttributes, CredentialStore, StorageError, StorageResult, StoredCredential};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Slots = BTreeMap<String, StoredCredential>;

/// Credential file permissions (Unix only): owner read/write.
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Directory permissions (Unix only): owner read/write/execute.
#[cfg(unix)]
const DIR_MODE: u32 = 0o700;

/// Credential store persisted as a JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable credential file is moved before it is replaced.
    fn quarantine_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    fn read_slots(&self) -> StorageResult<Slots> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Slots::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Slots::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Encoding(format!(
                "Credential file {} is not valid JSON: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Read the slots for a write. A corrupt file is moved aside and the
    /// write starts from an empty set of slots.
    fn read_slots_for_write(&self) -> StorageResult<Slots> {
        match self.read_slots() {
            Err(StorageError::Encoding(reason)) => {
                let quarantine = self.quarantine_path();
                warn!(
                    path = %self.path.display(),
                    moved_to = %quarantine.display(),
                    reason = %reason,
                    "Replacing unreadable credential file"
                );
                if let Err(e) = std::fs::rename(&self.path, &quarantine) {
                    warn!(error = %e, "Failed to move unreadable credential file aside");
                }
                Ok(Slots::new())
            }
            other => other,
        }
    }

    fn ensure_dir(&self) -> StorageResult<()> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(parent)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(parent, std::fs::Permissions::from_mode(DIR_MODE))?;
        }
        Ok(())
    }

    fn write_slots(&self, slots: &Slots) -> StorageResult<()> {
        self.ensure_dir()?;

        let content = serde_json::to_string_pretty(slots)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_owner_only(&tmp_path, content.as_bytes()) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Create (or truncate) `path` with owner-only permissions and write `bytes`.
#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .open(path)?;
    // A leftover temp file keeps its old mode; `mode` only applies on creation.
    file.set_permissions(std::fs::Permissions::from_mode(FILE_MODE))?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn set(&self, key: &str, value: &str, attributes: &CredentialAttributes) -> StorageResult<()> {
        debug!(path = %self.path.display(), key = %key, "Setting credential");

        let _guard = self.write_lock.lock();
        let mut slots = self.read_slots_for_write()?;
        slots.insert(key.to_string(), StoredCredential::new(value, attributes));
        self.write_slots(&slots)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.write_lock.lock();
        let mut slots = self.read_slots()?;

        match slots.get(key) {
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                debug!(key = %key, "Credential expired, purging");
                slots.remove(key);
                self.write_slots(&slots)?;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(path = %self.path.display(), key = %key, "Deleting credential");

        let _guard = self.write_lock.lock();
        let mut slots = self.read_slots_for_write()?;
        if slots.remove(key).is_none() {
            return Ok(false);
        }
        self.write_slots(&slots)?;
        Ok(true)
    }
}
