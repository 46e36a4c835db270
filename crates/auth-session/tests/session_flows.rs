mod common;

use auth_session::{Notification, SessionPhase, SessionState, UserProfile};
use common::{ana_json, pat_json, TestSession};
use session_config_and_utils::NotificationMessages;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn ana() -> UserProfile {
    UserProfile {
        id: "42".to_string(),
        name: "Ana".to_string(),
        email: "a@b.com".to_string(),
        photo_url: String::new(),
    }
}

async fn mount_login(session: &TestSession, token: &str) {
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(serde_json::json!({"email": "a@b.com", "password": "x"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": token})))
        .mount(&session.server)
        .await;
}

async fn mount_user(session: &TestSession, token: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(ana_json()))
        .mount(&session.server)
        .await;
}

#[tokio::test]
async fn password_login_authenticates_with_fetched_profile() {
    let mut session = TestSession::start().await;
    mount_login(&session, "T1").await;
    mount_user(&session, "T1").await;

    let state = session.handle.login("a@b.com", "x").await;

    assert_eq!(
        state,
        SessionState {
            authenticated: true,
            loading: false,
            user: ana(),
        }
    );
    assert_eq!(session.handle.phase(), SessionPhase::Authenticated);
    assert_eq!(session.slots.auth_token().unwrap().as_deref(), Some("T1"));
    assert_eq!(session.handle.request_config().bearer_token(), Some("T1"));
    assert_eq!(
        session.drain_notifications(),
        vec![Notification::success(NotificationMessages::default().login_success)]
    );
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let mut session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "Invalid credentials"})),
        )
        .mount(&session.server)
        .await;

    let state = session.handle.login("a@b.com", "wrong").await;

    assert!(!state.authenticated);
    assert!(!state.loading);
    assert!(state.is_consistent());
    assert_eq!(session.slots.auth_token().unwrap(), None);
    assert_eq!(
        session.drain_notifications(),
        vec![Notification::error("Invalid credentials")]
    );
}

#[tokio::test]
async fn blank_server_message_uses_generic_text() {
    let mut session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"message": ""})))
        .mount(&session.server)
        .await;

    let state = session.handle.login("a@b.com", "x").await;

    assert!(!state.authenticated);
    assert_eq!(
        session.drain_notifications(),
        vec![Notification::error(
            NotificationMessages::default().unexpected_error
        )]
    );
}

#[tokio::test]
async fn login_failure_without_message_uses_generic_text() {
    let mut session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&session.server)
        .await;

    session.handle.login("a@b.com", "x").await;

    assert_eq!(
        session.drain_notifications(),
        vec![Notification::error(
            NotificationMessages::default().unexpected_error
        )]
    );
}

#[tokio::test]
async fn startup_with_failing_google_token_signs_out_provider() {
    let session = TestSession::start().await;
    session.slots.set_google_token("G1").unwrap();
    Mock::given(method("POST"))
        .and(path("/user/google"))
        .and(body_json(serde_json::json!({"accessToken": "G1"})))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&session.server)
        .await;

    let state = session.handle.initialize().await;

    assert!(!state.authenticated);
    assert!(!state.loading);
    assert_eq!(state.user, UserProfile::default());
    assert_eq!(session.slots.google_token().unwrap(), None);
    assert_eq!(session.sign_out.calls(), 1);
    assert_eq!(session.handle.phase(), SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn google_token_populates_profile() {
    let session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/google"))
        .and(body_json(serde_json::json!({"accessToken": "G1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(pat_json()))
        .mount(&session.server)
        .await;

    let state = session.handle.handle_provider_token("G1").await;

    assert!(state.authenticated);
    assert!(!state.loading);
    assert_eq!(
        state.user,
        UserProfile {
            id: "r1".to_string(),
            name: "Pat".to_string(),
            email: "p@x.com".to_string(),
            photo_url: "u".to_string(),
        }
    );
    assert_eq!(session.slots.google_token().unwrap().as_deref(), Some("G1"));
    assert_eq!(session.sign_out.calls(), 0);
}

#[tokio::test]
async fn malformed_google_payload_never_authenticates() {
    let session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "emailAddresses": [],
            "names": [],
            "photos": [],
            "resourceName": "r1"
        })))
        .mount(&session.server)
        .await;

    let state = session.handle.handle_provider_token("G1").await;

    assert!(!state.authenticated);
    assert!(state.is_consistent());
    assert_eq!(session.slots.google_token().unwrap(), None);
    assert_eq!(session.sign_out.calls(), 1);
}

#[tokio::test]
async fn startup_prefers_first_party_token() {
    let session = TestSession::start().await;
    session.slots.set_auth_token("T1").unwrap();
    session.slots.set_google_token("G1").unwrap();
    mount_user(&session, "T1").await;
    Mock::given(method("POST"))
        .and(path("/user/google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pat_json()))
        .expect(0)
        .mount(&session.server)
        .await;

    let state = session.handle.initialize().await;

    assert!(state.authenticated);
    assert_eq!(state.user, ana());
    assert_eq!(session.handle.request_config().bearer_token(), Some("T1"));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let session = TestSession::start().await;
    mount_login(&session, "T1").await;
    mount_user(&session, "T1").await;
    session.slots.set_google_token("G1").unwrap();
    session.handle.login("a@b.com", "x").await;

    let first = session.handle.logout();
    let second = session.handle.logout();

    assert_eq!(first, second);
    assert_eq!(first, SessionState::default());
    assert_eq!(session.slots.auth_token().unwrap(), None);
    assert_eq!(session.handle.request_config().bearer_token(), None);
    // First-party logout leaves the Google slot and provider session alone.
    assert_eq!(session.slots.google_token().unwrap().as_deref(), Some("G1"));
    assert_eq!(session.sign_out.calls(), 0);
}

#[tokio::test]
async fn provider_logout_keeps_first_party_slot() {
    let session = TestSession::start().await;
    session.slots.set_auth_token("T1").unwrap();
    session.slots.set_google_token("G1").unwrap();

    let state = session.handle.logout_provider();

    assert_eq!(state, SessionState::default());
    assert_eq!(session.slots.google_token().unwrap(), None);
    assert_eq!(session.slots.auth_token().unwrap().as_deref(), Some("T1"));
    assert_eq!(session.sign_out.calls(), 1);
}

#[tokio::test]
async fn loading_resolves_on_every_path() {
    let session = TestSession::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&session.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/google"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&session.server)
        .await;

    assert!(session.handle.state().loading);

    let states = vec![
        session.handle.initialize().await,
        session.handle.login("a@b.com", "x").await,
        session.handle.handle_provider_token("G1").await,
        session.handle.logout(),
        session.handle.logout_provider(),
    ];

    for state in states {
        assert!(!state.loading);
        assert!(state.is_consistent());
    }
    assert_eq!(session.handle.phase(), SessionPhase::Unauthenticated);
}

#[tokio::test]
async fn profile_failure_after_login_clears_bearer_and_token() {
    let mut session = TestSession::start().await;
    mount_login(&session, "T1").await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&session.server)
        .await;

    let state = session.handle.login("a@b.com", "x").await;

    assert!(!state.authenticated);
    assert!(!state.loading);
    assert_eq!(session.slots.auth_token().unwrap(), None);
    assert_eq!(session.handle.request_config().bearer_token(), None);
    assert_eq!(
        session.drain_notifications(),
        vec![Notification::error(
            NotificationMessages::default().unexpected_error
        )]
    );
}

#[tokio::test]
async fn failed_relogin_keeps_existing_session() {
    let mut session = TestSession::start().await;
    mount_login(&session, "T1").await;
    mount_user(&session, "T1").await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(serde_json::json!({"email": "a@b.com", "password": "bad"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"message": "Senha incorreta"})),
        )
        .mount(&session.server)
        .await;

    session.handle.login("a@b.com", "x").await;
    session.drain_notifications();

    let state = session.handle.login("a@b.com", "bad").await;

    assert!(state.authenticated);
    assert_eq!(state.user, ana());
    assert_eq!(session.handle.phase(), SessionPhase::Authenticated);
    assert_eq!(session.slots.auth_token().unwrap().as_deref(), Some("T1"));
    assert_eq!(
        session.drain_notifications(),
        vec![Notification::error("Senha incorreta")]
    );
}

#[tokio::test]
async fn loading_holds_until_overlapping_operations_finish() {
    let session = TestSession::start().await;
    session.slots.set_auth_token("T0").unwrap();
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer T0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ana_json())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&session.server)
        .await;
    mount_login(&session, "T1").await;
    mount_user(&session, "T1").await;

    let handle = session.handle.clone();
    let startup = tokio::spawn(async move { handle.initialize().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let after_login = session.handle.login("a@b.com", "x").await;
    assert!(after_login.loading, "startup is still in flight");
    assert!(after_login.authenticated);
    assert_eq!(session.handle.phase(), SessionPhase::Loading);

    let after_startup = startup.await.unwrap();
    assert!(!after_startup.loading);
    assert!(after_startup.authenticated);
    assert_eq!(session.handle.phase(), SessionPhase::Authenticated);
    assert_eq!(session.handle.request_config().bearer_token(), Some("T1"));
    assert_eq!(session.slots.auth_token().unwrap().as_deref(), Some("T1"));
}

#[tokio::test]
async fn subscribers_observe_transitions() {
    let session = TestSession::start().await;
    mount_login(&session, "T1").await;
    mount_user(&session, "T1").await;
    let mut rx = session.handle.subscribe();

    session.handle.login("a@b.com", "x").await;

    assert!(rx.has_changed().unwrap());
    let observed = rx.borrow_and_update().clone();
    assert!(observed.authenticated);
    assert_eq!(observed.user, ana());

    session.handle.logout();
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), SessionState::default());
}
