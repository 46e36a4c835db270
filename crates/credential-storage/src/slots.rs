//! High-level API over the two credential slots.

use crate::{CredentialAttributes, CredentialStore, StorageKeys, StorageResult};
use std::sync::Arc;

/// Typed access to the first-party and Google credential slots.
///
/// Both slots share one backend but are otherwise independent: writing or
/// deleting one never touches the other.
#[derive(Clone)]
pub struct CredentialSlots {
    store: Arc<dyn CredentialStore>,
    attributes: CredentialAttributes,
}

impl CredentialSlots {
    /// Create slots over `store`, writing entries with `attributes`.
    pub fn new(store: Arc<dyn CredentialStore>, attributes: CredentialAttributes) -> Self {
        Self { store, attributes }
    }

    // ==========================================
    // First-party token
    // ==========================================

    pub fn auth_token(&self) -> StorageResult<Option<String>> {
        self.store.get(StorageKeys::AUTH_TOKEN)
    }

    pub fn set_auth_token(&self, token: &str) -> StorageResult<()> {
        self.store
            .set(StorageKeys::AUTH_TOKEN, token, &self.attributes)
    }

    pub fn clear_auth_token(&self) -> StorageResult<bool> {
        self.store.delete(StorageKeys::AUTH_TOKEN)
    }

    // ==========================================
    // Google token
    // ==========================================

    /// The stored Google token. An empty value reads as absent.
    pub fn google_token(&self) -> StorageResult<Option<String>> {
        Ok(self
            .store
            .get(StorageKeys::GOOGLE_AUTH_TOKEN)?
            .filter(|token| !token.is_empty()))
    }

    pub fn set_google_token(&self, token: &str) -> StorageResult<()> {
        self.store
            .set(StorageKeys::GOOGLE_AUTH_TOKEN, token, &self.attributes)
    }

    pub fn clear_google_token(&self) -> StorageResult<bool> {
        self.store.delete(StorageKeys::GOOGLE_AUTH_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCredentialStore;

    fn slots() -> CredentialSlots {
        CredentialSlots::new(
            Arc::new(MemoryCredentialStore::new()),
            CredentialAttributes::persistent(),
        )
    }

    #[test]
    fn test_slots_are_independent() {
        let slots = slots();

        slots.set_auth_token("T1").unwrap();
        slots.set_google_token("G1").unwrap();

        assert!(slots.clear_auth_token().unwrap());
        assert_eq!(slots.auth_token().unwrap(), None);
        assert_eq!(slots.google_token().unwrap(), Some("G1".to_string()));

        assert!(slots.clear_google_token().unwrap());
        assert_eq!(slots.google_token().unwrap(), None);
    }

    #[test]
    fn test_empty_google_token_reads_absent() {
        let slots = slots();
        slots.set_google_token("").unwrap();
        assert_eq!(slots.google_token().unwrap(), None);
    }
}
