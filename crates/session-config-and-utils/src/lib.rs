//! Core configuration, filesystem paths and logging setup shared by the
//! auth session crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, NotificationMessages, DEFAULT_API_URL, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogSettings};
pub use paths::Paths;
