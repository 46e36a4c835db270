//! Normalized user identity and the session snapshot.

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user, independent of how they signed in.
///
/// An empty `photo_url` means the user has no photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub photo_url: String,
}

impl UserProfile {
    /// Photo URL, or `None` when the profile has no photo.
    pub fn photo(&self) -> Option<&str> {
        if self.photo_url.is_empty() {
            None
        } else {
            Some(&self.photo_url)
        }
    }

    /// Whether the profile carries a usable identity (`id` and `email`).
    pub fn is_populated(&self) -> bool {
        !self.id.is_empty() && !self.email.is_empty()
    }

    /// Whether every field is empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Snapshot of the session as seen by the rest of the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
    pub loading: bool,
    pub user: UserProfile,
}

impl SessionState {
    /// State before startup has run: not authenticated, loading.
    pub fn initial() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// `authenticated` implies a populated user; otherwise the user is empty.
    pub fn is_consistent(&self) -> bool {
        if self.authenticated {
            self.user.is_populated()
        } else {
            self.user.is_empty()
        }
    }
}
