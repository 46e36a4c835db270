//! Output formatting for the CLI.

use auth_session::{Notification, Severity};
use clap::ValueEnum;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"status": "success", "message": message})
            );
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({"status": "error", "message": message})
            );
        }
    }
}

/// Print a notification emitted by the session.
pub fn print_notification(notification: &Notification, format: &OutputFormat) {
    match notification.severity {
        Severity::Success => print_success(&notification.message, format),
        Severity::Error => print_error(&notification.message, format),
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("{:<10} {}", format!("{}:", label), value);
}
