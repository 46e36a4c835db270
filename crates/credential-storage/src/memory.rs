//! In-memory credential store.
//!
//! Used for ephemeral sessions and tests; nothing survives the process.

use crate::{CredentialAttributes, CredentialStore, StorageResult, StoredCredential};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Credential store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    data: Mutex<HashMap<String, StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, key: &str, value: &str, attributes: &CredentialAttributes) -> StorageResult<()> {
        self.data
            .lock()
            .insert(key.to_string(), StoredCredential::new(value, attributes));
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().remove(key).is_some())
    }
}
