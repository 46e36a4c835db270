//! Storage trait definitions.

use crate::StorageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attributes attached to a stored credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialAttributes {
    /// How long the entry stays readable. `None` keeps it until deleted.
    pub max_age: Option<Duration>,
}

impl CredentialAttributes {
    /// Attributes for an entry that never expires.
    pub fn persistent() -> Self {
        Self::default()
    }

    /// Attributes for an entry readable for `max_age`.
    pub fn expiring_after(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }

    /// Absolute expiry for an entry written at `now`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.max_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .and_then(|age| now.checked_add_signed(age))
    }
}

/// A credential value as persisted by the backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Build an entry written now with the given attributes.
    pub fn new(value: &str, attributes: &CredentialAttributes) -> Self {
        Self {
            value: value.to_string(),
            expires_at: attributes.expires_at(Utc::now()),
        }
    }

    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Trait for credential storage backends.
///
/// A missing key is a normal outcome (`Ok(None)`), never an error.
pub trait CredentialStore: Send + Sync {
    /// Store a value under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str, attributes: &CredentialAttributes) -> StorageResult<()>;

    /// Retrieve a value. Expired entries read as absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete a value. Returns whether an entry existed.
    fn delete(&self, key: &str) -> StorageResult<bool>;
}
