//! Authentication commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_session::{Notification, SessionHandle};
use tokio::sync::mpsc::UnboundedReceiver;

/// A session handle plus the notifications it emits.
pub struct Session {
    pub handle: SessionHandle,
    pub notifications: UnboundedReceiver<Notification>,
}

impl Session {
    /// Print every notification emitted so far.
    fn flush_notifications(&mut self, format: &OutputFormat) {
        while let Ok(notification) = self.notifications.try_recv() {
            output::print_notification(&notification, format);
        }
    }
}

/// Show the session restored from persisted credentials.
pub async fn status(session: &mut Session, format: &OutputFormat) -> Result<()> {
    session.handle.initialize().await;
    session.flush_notifications(format);
    print_status(session, format)
}

/// Login with email and password.
pub async fn login(
    session: &mut Session,
    email: &str,
    password: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let current = session.handle.initialize().await;
    session.flush_notifications(format);
    if current.authenticated && current.user.email == email {
        output::print_success(&format!("Already logged in as {}", email), format);
        return Ok(());
    }

    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    session.handle.login(email, &password).await;
    session.flush_notifications(format);
    print_status(session, format)
}

/// Sign in with a Google access token. Startup is skipped so a stored Google
/// token is not exchanged before the new one.
pub async fn google(session: &mut Session, token: &str, format: &OutputFormat) -> Result<()> {
    if token.trim().is_empty() {
        output::print_error("Google access token is required", format);
        return Ok(());
    }

    session.handle.handle_provider_token(token.trim()).await;
    session.flush_notifications(format);
    print_status(session, format)
}

/// First-party logout.
pub fn logout(session: &mut Session, format: &OutputFormat) -> Result<()> {
    session.handle.logout();
    session.flush_notifications(format);
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Google logout.
pub fn logout_google(session: &mut Session, format: &OutputFormat) -> Result<()> {
    session.handle.logout_provider();
    session.flush_notifications(format);
    output::print_success("Logged out of Google successfully", format);
    Ok(())
}

fn print_status(session: &Session, format: &OutputFormat) -> Result<()> {
    let state = session.handle.state();

    match format {
        OutputFormat::Text => {
            if state.authenticated {
                output::print_row("Auth", "logged in");
                output::print_row("User ID", &state.user.id);
                output::print_row("Name", &state.user.name);
                output::print_row("Email", &state.user.email);
                output::print_row("Photo", state.user.photo().unwrap_or("none"));
            } else {
                output::print_row("Auth", "not logged in");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "event": session.handle.payload(),
                "state": state,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
