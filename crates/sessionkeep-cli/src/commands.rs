//! Subcommand handlers. Each one talks to the session gateway and prints a
//! short notification; the header is printed after state changes.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use sessionkeep_core::auth::{spawn_storage_watcher, AuthError};
use sessionkeep_core::config::ENV_PASSWORD;
use sessionkeep_core::models::ProfileView;
use sessionkeep_core::validation::{LoginForm, SignupForm};
use sessionkeep_core::{ApiClient, Config, SessionGateway};

use crate::header::{self, Screen};

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Date of birth as DD/MM/YYYY
    #[arg(long)]
    pub date_of_birth: Option<String>,
    /// Phone number starting with the country code, e.g. +91
    #[arg(long)]
    pub phone_number: Option<String>,
    /// Profile image file
    #[arg(long)]
    pub cover_image: Option<PathBuf>,
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

fn or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt_line(label),
    }
}

fn print_header(status: &sessionkeep_core::SessionStatus, screen: Screen) {
    println!("{}", header::render(status, screen));
}

/// Print an error as one or more notifications on stderr.
pub fn notify_error(err: &anyhow::Error) {
    match err.downcast_ref::<AuthError>() {
        Some(AuthError::Validation(errors)) => {
            eprintln!("Please fix the following:");
            for (field, message) in errors.iter() {
                eprintln!("  {:<16} {}", field, message);
            }
        }
        Some(auth) => {
            for message in auth.user_messages() {
                eprintln!("error: {}", message);
            }
            if auth.requires_login() {
                eprintln!("Run `sessionkeep login` to sign in.");
            }
        }
        None => eprintln!("error: {:#}", err),
    }
}

pub async fn login(
    gateway: &SessionGateway<ApiClient>,
    config: &Config,
    email: Option<String>,
) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(e) => {
            println!("Email: {}", e);
            e
        }
        None => prompt_line("Email")?,
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => prompt_password("Password")?,
    };

    let form = LoginForm { email, password };
    let status = gateway.login(&form).await?;

    if let Err(e) = Config::remember_email(&form.email) {
        warn!(error = %e, "Failed to save config");
    }

    let name = status
        .user
        .as_ref()
        .map(|u| ProfileView::new(u).display_name().to_string())
        .unwrap_or_default();
    println!("Logged in as {}", name);
    print_header(&status, Screen::Home);
    Ok(())
}

pub async fn signup(gateway: &SessionGateway<ApiClient>, args: SignupArgs) -> Result<()> {
    let form = SignupForm {
        full_name: or_prompt(args.full_name, "Full name")?,
        username: or_prompt(args.username, "Username")?,
        email: or_prompt(args.email, "Email")?,
        date_of_birth: or_prompt(args.date_of_birth, "Date of birth (DD/MM/YYYY)")?,
        phone_number: or_prompt(args.phone_number, "Phone number (+country code)")?,
        password: prompt_password("Password")?,
        confirm_password: prompt_password("Confirm password")?,
        cover_image: match args.cover_image {
            Some(path) => Some(path),
            None => Some(prompt_line("Profile image path")?)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        },
    };

    let response = gateway.register(&form).await?;
    debug!(message = ?response.message, "Registration response");
    println!("Account created successfully!");
    println!("Log in with `sessionkeep login --email {}`", form.email.trim());
    Ok(())
}

pub async fn logout(gateway: &SessionGateway<ApiClient>) -> Result<()> {
    if !gateway.status().await.is_authenticated {
        println!("Not logged in.");
        return Ok(());
    }
    match gateway.terminate_session().await {
        Ok(()) => println!("Logged out successfully"),
        Err(e @ AuthError::Storage(_)) => return Err(e.into()),
        Err(e) => {
            println!("Logged out on this machine.");
            warn!(error = %e, "Server did not confirm logout");
            return Err(e.into());
        }
    }
    print_header(&gateway.status().await, Screen::Login);
    Ok(())
}

pub async fn status(gateway: &SessionGateway<ApiClient>, json: bool) -> Result<()> {
    let status = gateway.status().await;
    if json {
        // The token stays on disk; it is not echoed.
        let out = serde_json::json!({
            "isAuthenticated": status.is_authenticated,
            "user": status.user,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_header(&status, Screen::Home);
    if status.is_authenticated {
        println!("Status: logged in");
    } else {
        println!("Status: not logged in");
    }
    Ok(())
}

pub async fn whoami(gateway: &SessionGateway<ApiClient>) -> Result<()> {
    let user = gateway.current_user().await?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

pub async fn watch(gateway: &SessionGateway<ApiClient>, interval_ms: u64) -> Result<()> {
    let store = gateway.store();
    let mut rx = store.lock().await.subscribe();
    let watcher = spawn_storage_watcher(store, Duration::from_millis(interval_ms.max(50)));

    print_header(&rx.borrow_and_update().clone(), Screen::Home);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = rx.borrow_and_update().clone();
                if status.is_authenticated {
                    println!("Session started elsewhere");
                } else {
                    println!("Session ended elsewhere");
                }
                print_header(&status, Screen::Home);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    watcher.abort();
    Ok(())
}
