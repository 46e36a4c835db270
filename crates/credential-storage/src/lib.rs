//! Durable credential storage for the auth session client.
//!
//! Two independent slots hold opaque tokens: the first-party bearer token and
//! the Google access token. Backends:
//! - **Memory**: process-local, for ephemeral sessions and tests
//! - **File**: a JSON file readable right after a restart, no network needed

mod file;
mod keys;
mod memory;
mod slots;
mod traits;

pub use file::FileCredentialStore;
pub use keys::StorageKeys;
pub use memory::MemoryCredentialStore;
pub use slots::CredentialSlots;
pub use traits::{CredentialAttributes, CredentialStore, StoredCredential};

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
