//! Storage key constants.

/// Credential slot keys.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer token issued by the first-party backend after password login.
    pub const AUTH_TOKEN: &'static str = "auth_token";

    /// Access token issued by the Google OAuth flow.
    pub const GOOGLE_AUTH_TOKEN: &'static str = "google_auth_token";
}
