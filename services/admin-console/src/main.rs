//! Admin console CLI
//!
//! Thin shell over the authenticated client:
//! 1. Loads TOML configuration and the persisted credential file
//! 2. Runs one command (login, logout, whoami, or a raw service call)
//! 3. Prints the response payload as JSON on stdout
//! 4. Renders failures through the error presenter on stderr, exit code 1

mod cli;
mod config;
mod notifier;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console_auth::{FileCredentialStore, Session};
use console_http::{ClassifiedError, ErrorPresenter, HttpClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{BodyArgs, Cli, Command, QueryArgs};
use crate::config::Config;
use crate::notifier::TerminalNotifier;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // JSON logs on stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.as_path();
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let store = FileCredentialStore::load(config.credentials.path.clone()).with_context(|| {
        format!(
            "failed to load credentials from {}",
            config.credentials.path.display()
        )
    })?;

    let session = Arc::new(Session::new(
        Arc::new(store),
        Arc::new(|| warn!("session expired, run `admin-console login`")),
    ));

    let client = HttpClient::new(config.client_config(), session)
        .context("failed to build HTTP client")?;

    info!(
        base_url = %config.api.base_url,
        timeout_ms = config.api.timeout_ms,
        success_code = config.api.success_code,
        "configuration loaded"
    );

    match run(&client, &cli, &config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            let presenter = ErrorPresenter::new(Arc::new(TerminalNotifier::new(std::io::stderr())));
            presenter.present(&e, &cli.present_options());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(client: &HttpClient, cli: &Cli, config: &Config) -> Result<(), ClassifiedError> {
    match &cli.command {
        Command::Login { username, password } => {
            client.login(username, password).await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Whoami => {
            let session = client.session();
            let status = serde_json::json!({
                "credentials": config.credentials.path.display().to_string(),
                "hasAccessToken": session.access_token().is_some(),
                "hasRefreshToken": session.refresh_token().is_some(),
            });
            print_json(&status);
        }
        Command::Get(QueryArgs {
            service,
            path,
            query,
        }) => {
            let query = borrow_pairs(query);
            let payload: serde_json::Value = client.get(service, path, &query).await?;
            print_json(&payload);
        }
        Command::Delete(QueryArgs {
            service,
            path,
            query,
        }) => {
            let query = borrow_pairs(query);
            let payload: serde_json::Value = client.delete(service, path, &query).await?;
            print_json(&payload);
        }
        Command::Post(BodyArgs {
            service,
            path,
            body,
        }) => print_json(&client.post(service, path, body).await?),
        Command::Put(BodyArgs {
            service,
            path,
            body,
        }) => print_json(&client.put(service, path, body).await?),
        Command::Patch(BodyArgs {
            service,
            path,
            body,
        }) => print_json(&client.patch(service, path, body).await?),
    }
    Ok(())
}

fn borrow_pairs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "failed to render payload"),
    }
}
