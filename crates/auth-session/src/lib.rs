//! Client-side authentication session.
//!
//! This crate provides:
//! - Password login against the first-party backend
//! - Google sign-in through the backend token bridge
//! - Session reconstruction from persisted credentials on startup
//! - Explicit FSM-based session phase tracking
//! - A shared handle exposing the session snapshot, subscription and operations

pub mod api;
mod auth_fsm;
mod error;
pub mod identity;
mod notifier;
mod profile;
mod provider;
mod session;
mod session_runtime;

pub use api::{ApiClient, RequestConfig};
pub use auth_fsm::session_machine;
pub use auth_fsm::{
    SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase,
    SessionStateChangedPayload,
};
pub use error::{AuthError, AuthResult, FetchError, FetchFailure, ServerMessage};
pub use identity::{fetch_first_party_profile, fetch_provider_profile};
pub use notifier::{ChannelNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use profile::{SessionState, UserProfile};
pub use provider::{ProviderSignOut, TracingProviderSignOut};
pub use session::SessionManager;
pub use session_runtime::SessionHandle;
