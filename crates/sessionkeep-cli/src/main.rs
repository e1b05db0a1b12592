//! sessionkeep - log in, sign up and check session status from the terminal.

mod commands;
mod header;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessionkeep_core::auth::FileStorage;
use sessionkeep_core::{ApiClient, Config, SessionGateway, SessionStore};

use commands::SignupArgs;

/// Log file name in the data directory
const LOG_FILE: &str = "sessionkeep.log";

#[derive(Parser)]
#[command(name = "sessionkeep", version, about = "Log in and manage your session")]
struct Cli {
    /// Base URL of the authentication API
    #[arg(long, global = true, env = "SESSIONKEEP_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with email and password
    Login {
        #[arg(long, env = "SESSIONKEEP_EMAIL")]
        email: Option<String>,
    },
    /// Create an account
    Signup(SignupArgs),
    /// Log out and forget the stored session
    Logout,
    /// Show the header and current session status
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch your profile from the server
    Whoami,
    /// Print session changes made by other processes until interrupted
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

/// Initialize the tracing subscriber for logging.
/// Stderr gets `RUST_LOG` (default warn); the log file gets debug and up.
fn init_tracing(log_dir: &Path) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(stderr_filter);

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("sessionkeep_core=debug,sessionkeep=debug"));
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config(api_url: Option<String>) -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    config.apply_overrides(|k| std::env::var(k).ok());
    if let Some(url) = api_url {
        config.api_base_url = url;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let data_dir = Config::data_dir().unwrap_or_else(|_| PathBuf::from("./.sessionkeep"));
    let log_guard = init_tracing(&data_dir);

    let config = load_config(cli.api_url);
    info!(api = %config.api_base_url, "sessionkeep starting");

    let mut store = SessionStore::new(Box::new(FileStorage::in_dir(&data_dir)));
    store.initialize();
    let gateway = SessionGateway::new(ApiClient::new(&config)?, store);

    let outcome = match cli.command.unwrap_or(Command::Status { json: false }) {
        Command::Login { email } => commands::login(&gateway, &config, email).await,
        Command::Signup(args) => commands::signup(&gateway, args).await,
        Command::Logout => commands::logout(&gateway).await,
        Command::Status { json } => commands::status(&gateway, json).await,
        Command::Whoami => commands::whoami(&gateway).await,
        Command::Watch { interval_ms } => commands::watch(&gateway, interval_ms).await,
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) => {
            commands::notify_error(&e);
            // Flush the file log before exiting.
            drop(log_guard);
            std::process::exit(1);
        }
    }
}
