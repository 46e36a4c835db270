//! authctl - drive the auth session client from the command line.

mod commands;
mod output;

use anyhow::Context;
use auth_session::{ChannelNotifier, SessionHandle, SessionManager};
use clap::{Parser, Subcommand};
use session_config_and_utils::{init_logging, Config, LogSettings, Paths};
use std::sync::Arc;
use tracing::debug;

/// authctl - sign in, sign out and inspect the persisted session.
#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "Command-line driver for the auth session client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding config, credentials and logs
    #[arg(long, env = "AUTHSESSION_HOME", global = true)]
    home: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore the session from persisted credentials and print it
    Status,

    /// Login with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Password (prompted without echo when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Logout and clear the first-party credential
    Logout,

    /// Sign in with a Google access token
    Google {
        /// Google OAuth access token
        #[arg(short, long)]
        token: String,
    },

    /// Logout of Google and clear the Google credential
    LogoutGoogle,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match cli.home {
        Some(home) => Paths::with_base_dir(home),
        None => Paths::new()?,
    };

    let mut config = Config::load(&paths).context("failed to load config")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }

    init_logging(&LogSettings {
        service_name: "authctl".into(),
        default_level: config.log_level.clone(),
        log_path: paths.log_file(),
        also_stderr: false,
    })?;
    debug!(base_dir = %paths.base_dir().display(), "authctl starting");

    let (notifier, notifications) = ChannelNotifier::new();
    let manager = SessionManager::from_config(&config, &paths)?.with_notifier(Arc::new(notifier));
    let mut session = commands::Session {
        handle: SessionHandle::new(manager),
        notifications,
    };

    match cli.command {
        Commands::Status => commands::status(&mut session, &cli.format).await,
        Commands::Login { email, password } => {
            commands::login(&mut session, &email, password, &cli.format).await
        }
        Commands::Logout => commands::logout(&mut session, &cli.format),
        Commands::Google { token } => commands::google(&mut session, &token, &cli.format).await,
        Commands::LogoutGoogle => commands::logout_google(&mut session, &cli.format),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
