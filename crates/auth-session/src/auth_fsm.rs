//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  Uninitialized  │ (initial)
//! └────────┬────────┘
//!          │ Begin                     SignedOut
//!          ▼
//! ┌─────────────────┐ ◄─── Begin ───┐
//! │     Loading     │ ── Begin ──►  │ (overlapping operations stay in Loading)
//! └────────┬────────┘ ──────────────┘
//!          │
//!          │ ProfileVerified / Resume      Rejected / SignedOut
//!          ▼                               ▼
//! ┌─────────────────┐             ┌─────────────────┐
//! │  Authenticated  │ ─SignedOut─►│ Unauthenticated │
//! └────────┬────────┘             └────────┬────────┘
//!          │ Begin                         │ Begin
//!          ▼                               ▼
//!       Loading                         Loading
//! ```
//!
//! `Loading` is held while at least one operation is in flight. The session
//! manager only feeds a completion input (`ProfileVerified`, `Resume`,
//! `Rejected`) when the last overlapping operation finishes.

use crate::SessionState;
use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Uninitialized)

    Uninitialized => {
        Begin => Loading,
        SignedOut => Unauthenticated
    },
    Loading => {
        Begin => Loading,
        // The operation's own profile fetch succeeded
        ProfileVerified => Authenticated,
        // The operation failed but an earlier identity is still signed in
        Resume => Authenticated,
        Rejected => Unauthenticated,
        SignedOut => Unauthenticated
    },
    Authenticated => {
        Begin => Loading,
        SignedOut => Unauthenticated
    },
    Unauthenticated => {
        Begin => Loading,
        SignedOut => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Session phase for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Startup has not run yet.
    Uninitialized,
    /// At least one operation is in flight.
    Loading,
    Authenticated,
    Unauthenticated,
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Uninitialized => SessionPhase::Uninitialized,
            SessionMachineState::Loading => SessionPhase::Loading,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
            SessionMachineState::Unauthenticated => SessionPhase::Unauthenticated,
        }
    }
}

/// Payload for session state change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStateChangedPayload {
    pub phase: SessionPhase,
    pub authenticated: bool,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionStateChangedPayload {
    pub fn new(phase: SessionPhase, state: &SessionState) -> Self {
        let populated = state.authenticated && state.user.is_populated();

        Self {
            phase,
            authenticated: state.authenticated,
            loading: state.loading,
            user_id: populated.then(|| state.user.id.clone()),
            email: populated.then(|| state.user.email.clone()),
        }
    }
}
