#![allow(dead_code)]

use auth_session::{ApiClient, ChannelNotifier, Notification, ProviderSignOut, SessionHandle, SessionManager};
use credential_storage::{CredentialAttributes, CredentialSlots, CredentialStore, MemoryCredentialStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;
use wiremock::MockServer;

/// Counts provider sign-out calls.
#[derive(Default)]
pub struct RecordingSignOut {
    calls: AtomicUsize,
}

impl RecordingSignOut {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProviderSignOut for RecordingSignOut {
    fn sign_out(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// A session wired to a mock backend, with observable collaborators.
pub struct TestSession {
    pub server: MockServer,
    pub handle: SessionHandle,
    pub slots: CredentialSlots,
    pub notifications: UnboundedReceiver<Notification>,
    pub sign_out: Arc<RecordingSignOut>,
}

impl TestSession {
    /// Session over an in-memory credential store.
    pub async fn start() -> Self {
        Self::with_store(Arc::new(MemoryCredentialStore::new())).await
    }

    /// Session over the given credential store.
    pub async fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        let server = MockServer::start().await;
        let slots = CredentialSlots::new(store, CredentialAttributes::persistent());
        let (handle, notifications, sign_out) = build_handle(&server.uri(), slots.clone());

        Self {
            server,
            handle,
            slots,
            notifications,
            sign_out,
        }
    }

    /// Drain every notification emitted so far.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }
}

/// Build a session handle for `base_url` over `slots`.
pub fn build_handle(
    base_url: &str,
    slots: CredentialSlots,
) -> (SessionHandle, UnboundedReceiver<Notification>, Arc<RecordingSignOut>) {
    let api = ApiClient::new(
        Url::parse(base_url).expect("invalid mock server url"),
        Duration::from_secs(5),
    )
    .expect("failed to build api client");
    let (notifier, notifications) = ChannelNotifier::new();
    let sign_out = Arc::new(RecordingSignOut::default());

    let manager = SessionManager::new(api, slots)
        .with_notifier(Arc::new(notifier))
        .with_provider_sign_out(sign_out.clone());

    (SessionHandle::new(manager), notifications, sign_out)
}

pub fn ana_json() -> serde_json::Value {
    serde_json::json!({"id": "42", "name": "Ana", "email": "a@b.com"})
}

pub fn pat_json() -> serde_json::Value {
    serde_json::json!({
        "emailAddresses": [{"value": "p@x.com"}],
        "names": [{"displayName": "Pat"}],
        "photos": [{"url": "u"}],
        "resourceName": "r1"
    })
}
