//! Session management using FSM-based state tracking.
//!
//! `SessionManager` is the single writer of [`SessionState`]. It derives the
//! state from the credential store on startup, drives the two login paths and
//! funnels every fetch failure into the logout of the matching kind. Callers
//! never see network or auth errors; they observe the resulting state and the
//! notifications emitted along the way.

use crate::api::{ApiClient, RequestConfig};
use crate::auth_fsm::{
    SessionMachine, SessionMachineInput, SessionPhase, SessionStateChangedPayload,
};
use crate::error::{FetchError, ServerMessage};
use crate::identity::{fetch_first_party_profile, fetch_provider_profile};
use crate::notifier::{Notification, Notifier, TracingNotifier};
use crate::provider::{ProviderSignOut, TracingProviderSignOut};
use crate::{AuthError, AuthResult, SessionState, UserProfile};
use credential_storage::{
    CredentialAttributes, CredentialSlots, FileCredentialStore, StorageResult,
};
use parking_lot::{Mutex, RwLock};
use session_config_and_utils::{Config, NotificationMessages, Paths};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// FSM plus the number of operations currently in flight.
struct Lifecycle {
    fsm: SessionMachine,
    /// `loading` is cleared when this drops to zero, not when each operation
    /// finishes. An operation that completes while another is still running
    /// leaves `loading == true` until the last one settles.
    in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignOutKind {
    FirstParty,
    Google,
}

/// Owns the authoritative session state and its transitions.
pub struct SessionManager {
    api: ApiClient,
    credentials: CredentialSlots,
    /// Bearer applied to outgoing calls. One credential active at a time.
    request_config: RwLock<RequestConfig>,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<SessionState>,
    notifier: Arc<dyn Notifier>,
    provider_sign_out: Arc<dyn ProviderSignOut>,
    messages: NotificationMessages,
}

impl SessionManager {
    /// Create a session manager. Nothing is read from storage until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(api: ApiClient, credentials: CredentialSlots) -> Self {
        let (state_tx, _) = watch::channel(SessionState::initial());

        Self {
            api,
            credentials,
            request_config: RwLock::new(RequestConfig::default()),
            lifecycle: Mutex::new(Lifecycle {
                fsm: SessionMachine::new(),
                in_flight: 0,
            }),
            state_tx,
            notifier: Arc::new(TracingNotifier),
            provider_sign_out: Arc::new(TracingProviderSignOut),
            messages: NotificationMessages::default(),
        }
    }

    /// Build a manager from configuration, persisting credentials in the
    /// file under `paths`.
    pub fn from_config(config: &Config, paths: &Paths) -> AuthResult<Self> {
        let api_url = config
            .api_url()
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let api = ApiClient::new(api_url, config.request_timeout())?;

        let attributes = match config.credential_max_age() {
            Some(max_age) => CredentialAttributes::expiring_after(max_age),
            None => CredentialAttributes::persistent(),
        };
        let store = FileCredentialStore::new(paths.credentials_file());
        info!(
            api_url = %api.base_url(),
            credentials = %store.path().display(),
            "Session client configured"
        );
        let credentials = CredentialSlots::new(Arc::new(store), attributes);

        Ok(Self::new(api, credentials).with_messages(config.messages.clone()))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_provider_sign_out(mut self, provider_sign_out: Arc<dyn ProviderSignOut>) -> Self {
        self.provider_sign_out = provider_sign_out;
        self
    }

    pub fn with_messages(mut self, messages: NotificationMessages) -> Self {
        self.messages = messages;
        self
    }

    // ==========================================
    // Observation
    // ==========================================

    /// Current session snapshot.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Current FSM phase.
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.lifecycle.lock().fsm.state())
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Snapshot as a serializable event payload.
    pub fn payload(&self) -> SessionStateChangedPayload {
        let lifecycle = self.lifecycle.lock();
        let phase = SessionPhase::from(lifecycle.fsm.state());
        SessionStateChangedPayload::new(phase, &self.state_tx.borrow())
    }

    /// Request configuration other API consumers should attach to their calls.
    pub fn request_config(&self) -> RequestConfig {
        self.request_config.read().clone()
    }

    // ==========================================
    // Operations
    // ==========================================

    /// Reconstruct the session from persisted credentials.
    ///
    /// A first-party token takes precedence; the Google token is only used when
    /// no first-party token exists.
    pub async fn initialize(&self) -> SessionState {
        self.begin_operation("startup");
        let succeeded = self.restore_from_credentials().await;
        self.finish_operation("startup", succeeded);
        self.state()
    }

    /// Password login against the first-party backend.
    pub async fn login(&self, email: &str, password: &str) -> SessionState {
        self.begin_operation("login");
        let succeeded = self.login_with_password(email, password).await;
        self.finish_operation("login", succeeded);
        self.state()
    }

    /// Sign in with a Google access token.
    pub async fn handle_provider_token(&self, access_token: &str) -> SessionState {
        self.begin_operation("google_token");
        let succeeded = self.exchange_provider_token(access_token).await;
        self.finish_operation("google_token", succeeded);
        self.state()
    }

    /// First-party logout. Synchronous and infallible.
    pub fn logout(&self) -> SessionState {
        self.sign_out(SignOutKind::FirstParty);
        self.state()
    }

    /// Google logout: also revokes the provider session.
    pub fn logout_provider(&self) -> SessionState {
        self.sign_out(SignOutKind::Google);
        self.state()
    }

    // ==========================================
    // Flows
    // ==========================================

    async fn restore_from_credentials(&self) -> bool {
        if let Some(token) = self.read_slot("auth_token", self.credentials.auth_token()) {
            info!(token_len = token.len(), "Restoring session from first-party token");
            self.request_config.write().set_bearer(&token);

            return match self.load_first_party_profile(&token).await {
                Ok(()) => true,
                Err(e) => {
                    if let Some(message) = &e.server_message {
                        self.notifier.notify(Notification::error(message.text()));
                    }
                    false
                }
            };
        }

        if let Some(token) = self.read_slot("google_auth_token", self.credentials.google_token()) {
            info!(token_len = token.len(), "Restoring session from Google token");
            return self.exchange_provider_token(&token).await;
        }

        info!("No persisted credentials found");
        false
    }

    async fn login_with_password(&self, email: &str, password: &str) -> bool {
        debug!("Attempting password login");

        let request_config = self.request_config();
        let token = match self.api.login(&request_config, email, password).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Login failed");
                self.notify_login_failure(&e);
                return false;
            }
        };

        self.request_config.write().set_bearer(&token);
        if let Err(e) = self.credentials.set_auth_token(&token) {
            error!(error = %e, "Failed to persist first-party token");
            self.sign_out(SignOutKind::FirstParty);
            self.notify_login_failure(&AuthError::Storage(e));
            return false;
        }

        if let Err(e) = self.load_first_party_profile(&token).await {
            let message = match &e.server_message {
                Some(message) => message.text().to_string(),
                None => self.messages.unexpected_error.clone(),
            };
            self.notifier.notify(Notification::error(message));
            return false;
        }

        info!("Login successful");
        self.notifier
            .notify(Notification::success(self.messages.login_success.clone()));
        true
    }

    async fn exchange_provider_token(&self, access_token: &str) -> bool {
        if access_token.is_empty() {
            warn!("Ignoring empty Google token");
            return false;
        }

        if let Err(e) = self.credentials.set_google_token(access_token) {
            warn!(error = %e, "Failed to persist Google token");
        }

        let request_config = self.request_config();
        match fetch_provider_profile(&self.api, &request_config, access_token).await {
            Ok(profile) => {
                info!(user_id = %profile.id, "Google sign-in successful");
                self.apply_profile(profile);
                true
            }
            Err(e) => {
                error!(reason = %e.reason, error = %e, "Google token exchange failed, signing out");
                self.sign_out(SignOutKind::Google);
                false
            }
        }
    }

    /// Fetch the first-party profile and apply it. A failure signs out.
    async fn load_first_party_profile(&self, token: &str) -> Result<(), FetchError> {
        match fetch_first_party_profile(&self.api, token).await {
            Ok(profile) => {
                info!(user_id = %profile.id, "First-party profile loaded");
                self.apply_profile(profile);
                Ok(())
            }
            Err(e) => {
                warn!(reason = %e.reason, error = %e, "First-party profile fetch failed, signing out");
                self.sign_out(SignOutKind::FirstParty);
                Err(e)
            }
        }
    }

    fn notify_login_failure(&self, error: &AuthError) {
        match error.server_message() {
            Some(ServerMessage::Text(message)) => {
                self.notifier.notify(Notification::error(message.clone()));
            }
            Some(ServerMessage::Structured(rendered)) => {
                self.notifier
                    .notify(Notification::error(self.messages.unexpected_error.clone()));
                self.notifier.notify(Notification::error(rendered.clone()));
            }
            None => {
                self.notifier
                    .notify(Notification::error(self.messages.unexpected_error.clone()));
            }
        }
    }

    fn read_slot(&self, slot: &'static str, result: StorageResult<Option<String>>) -> Option<String> {
        match result {
            Ok(token) => token,
            Err(e) => {
                warn!(slot, error = %e, "Failed to read credential, treating as absent");
                None
            }
        }
    }

    // ==========================================
    // State writes
    // ==========================================

    fn apply_profile(&self, profile: UserProfile) {
        let _lifecycle = self.lifecycle.lock();
        self.state_tx.send_modify(|state| {
            state.user = profile;
            state.authenticated = true;
        });
    }

    fn sign_out(&self, kind: SignOutKind) {
        {
            let mut lifecycle = self.lifecycle.lock();
            self.request_config.write().clear_bearer();

            let deleted = match kind {
                SignOutKind::FirstParty => self.credentials.clear_auth_token(),
                SignOutKind::Google => self.credentials.clear_google_token(),
            };
            if let Err(e) = deleted {
                warn!(kind = ?kind, error = %e, "Failed to delete credential");
            }

            self.state_tx.send_if_modified(|state| {
                let changed = state.authenticated || !state.user.is_empty();
                state.authenticated = false;
                state.user = UserProfile::default();
                changed
            });
            self.settle(&mut lifecycle, SessionMachineInput::SignedOut);
        }

        if kind == SignOutKind::Google {
            self.provider_sign_out.sign_out();
        }
        info!(kind = ?kind, "Signed out");
    }

    fn begin_operation(&self, operation: &'static str) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.in_flight += 1;
        debug!(operation, in_flight = lifecycle.in_flight, "Session operation started");
        self.settle(&mut lifecycle, SessionMachineInput::Begin);
    }

    fn finish_operation(&self, operation: &'static str, succeeded: bool) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.in_flight = lifecycle.in_flight.saturating_sub(1);

        let authenticated = self.state_tx.borrow().authenticated;
        let input = match (authenticated, succeeded) {
            (true, true) => SessionMachineInput::ProfileVerified,
            (true, false) => SessionMachineInput::Resume,
            (false, _) => SessionMachineInput::Rejected,
        };
        debug!(
            operation,
            succeeded,
            in_flight = lifecycle.in_flight,
            "Session operation finished"
        );
        self.settle(&mut lifecycle, input);
    }

    /// Apply `input`, re-enter `Loading` while other operations are still in
    /// flight, and publish the resulting `loading` flag.
    fn settle(&self, lifecycle: &mut Lifecycle, input: SessionMachineInput) {
        let is_completion = !matches!(
            input,
            SessionMachineInput::Begin | SessionMachineInput::SignedOut
        );

        // Completions only apply once the last overlapping operation is done.
        if !(is_completion && lifecycle.in_flight > 0) {
            if let Err(e) = Self::transition(lifecycle, &input) {
                warn!(error = %e, "Ignoring session transition");
            }
        }
        if lifecycle.in_flight > 0 {
            if let Err(e) = Self::transition(lifecycle, &SessionMachineInput::Begin) {
                warn!(error = %e, "Ignoring session transition");
            }
        }

        let loading = lifecycle.in_flight > 0;
        self.state_tx.send_if_modified(|state| {
            if state.loading == loading {
                return false;
            }
            state.loading = loading;
            true
        });
    }

    /// Transition the FSM, logging phase changes.
    fn transition(lifecycle: &mut Lifecycle, input: &SessionMachineInput) -> AuthResult<SessionPhase> {
        let old_phase = SessionPhase::from(lifecycle.fsm.state());

        lifecycle.fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                lifecycle.fsm.state()
            ))
        })?;

        let new_phase = SessionPhase::from(lifecycle.fsm.state());
        if old_phase != new_phase {
            debug!(
                old_phase = ?old_phase,
                new_phase = ?new_phase,
                "Session phase transition"
            );
        }

        Ok(new_phase)
    }
}
