//! Shared session handle.
//!
//! The single integration point for the rest of the application: a cheaply
//! cloneable handle over one `SessionManager`, so every consumer observes the
//! same state and transitions.

use crate::api::RequestConfig;
use crate::{AuthResult, SessionManager, SessionPhase, SessionState, SessionStateChangedPayload};
use session_config_and_utils::{Config, Paths};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shared session handle.
#[derive(Clone)]
pub struct SessionHandle {
    session_manager: Arc<SessionManager>,
}

impl SessionHandle {
    pub fn new(session_manager: SessionManager) -> Self {
        Self {
            session_manager: Arc::new(session_manager),
        }
    }

    /// Build a handle backed by the credential file under `paths`.
    pub fn from_config(config: &Config, paths: &Paths) -> AuthResult<Self> {
        Ok(Self::new(SessionManager::from_config(config, paths)?))
    }

    /// Access the underlying session manager.
    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn state(&self) -> SessionState {
        self.session_manager.state()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session_manager.phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session_manager.subscribe()
    }

    pub fn payload(&self) -> SessionStateChangedPayload {
        self.session_manager.payload()
    }

    pub fn request_config(&self) -> RequestConfig {
        self.session_manager.request_config()
    }

    /// Run startup and wait for it.
    pub async fn initialize(&self) -> SessionState {
        self.session_manager.initialize().await
    }

    /// Run startup in the background. Observers can use
    /// [`wait_until_ready`](Self::wait_until_ready).
    pub fn spawn_initialize(&self) -> JoinHandle<SessionState> {
        let handle = self.clone();
        tokio::spawn(async move { handle.initialize().await })
    }

    /// Wait until no operation is loading.
    pub async fn wait_until_ready(&self) -> SessionState {
        let mut rx = self.subscribe();
        let ready = rx.wait_for(|state| !state.loading).await.map(|state| state.clone());
        ready.unwrap_or_else(|_| self.state())
    }

    pub async fn login(&self, email: &str, password: &str) -> SessionState {
        self.session_manager.login(email, password).await
    }

    pub async fn handle_provider_token(&self, access_token: &str) -> SessionState {
        self.session_manager.handle_provider_token(access_token).await
    }

    pub fn logout(&self) -> SessionState {
        self.session_manager.logout()
    }

    pub fn logout_provider(&self) -> SessionState {
        self.session_manager.logout_provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthError;
    use tempfile::tempdir;

    #[test]
    fn test_from_config_rejects_invalid_url() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let mut config = Config::default();
        config.api_url = "not a url".to_string();

        assert!(matches!(
            SessionHandle::from_config(&config, &paths),
            Err(AuthError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let handle = SessionHandle::from_config(&Config::default(), &paths).unwrap();
        let other = handle.clone();

        let mut rx = other.subscribe();
        handle.logout();

        assert!(rx.has_changed().unwrap());
        assert_eq!(other.phase(), SessionPhase::Unauthenticated);
        assert!(!other.state().loading);
    }

    #[tokio::test]
    async fn test_wait_until_ready_after_spawned_startup() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let handle = SessionHandle::from_config(&Config::default(), &paths).unwrap();

        let startup = handle.spawn_initialize();
        let ready = handle.wait_until_ready().await;

        assert!(!ready.loading);
        assert!(!ready.authenticated);
        assert_eq!(startup.await.unwrap(), ready);
        assert_eq!(handle.phase(), SessionPhase::Unauthenticated);
    }
}
