//! grantwatch: alerts on access to a watched Common Fate permission set.

mod dispatch;
mod error;
mod grants_client;
mod middleware;
mod routes;
mod state;
mod telemetry;

use anyhow::Context;
use clap::{Parser, Subcommand};
use grantwatch_audit::decode;
use grantwatch_core::GrantwatchConfig;
use grantwatch_policy::{Verdict, decide, match_targets};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "grantwatch", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "GRANTWATCH_CONFIG",
        default_value = "grantwatch.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server (default)
    Serve,
    /// Decode an audit event from a file and show the decision table outcome
    /// without contacting the grants service
    Inspect {
        /// File holding one JSON audit event
        file: PathBuf,

        /// Permission set to match against; read from the config file when omitted
        #[arg(long)]
        permission_set_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config).await,
        Command::Inspect {
            file,
            permission_set_id,
        } => inspect(&cli.config, &file, permission_set_id),
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let config = GrantwatchConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    telemetry::init(&config.logging);

    let state = Arc::new(state::AppState::init(&config)?);
    let app = routes::create_router(state, &config.server.webhook_path);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(
        bind = %config.server.bind,
        webhook_path = %config.server.webhook_path,
        permission_set_id = %config.watch.permission_set_id,
        "grantwatch-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("grantwatch-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}

fn inspect(
    config_path: &Path,
    file: &Path,
    permission_set_id: Option<String>,
) -> anyhow::Result<()> {
    let permission_set_id = match permission_set_id {
        Some(id) => id,
        None => {
            GrantwatchConfig::from_file(config_path)
                .with_context(|| format!("loading {}", config_path.display()))?
                .watch
                .permission_set_id
        }
    };

    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let log = decode(&bytes)?;
    println!("{}", log.to_log_line());

    let matched = match_targets(&log.targets, &permission_set_id);
    let outcome = match decide(&log.action, &matched)? {
        Verdict::Decided(decision) => serde_json::to_value(decision)?,
        Verdict::NeedsGrantStatus(lookup) => json!({
            "decision": "needs_grant_status",
            "grant_id": lookup.grant_id,
            "access_request_id": lookup.access_request_id,
        }),
    };

    let report = json!({
        "event_id": log.id,
        "action": log.action.as_str(),
        "permission_set_id": permission_set_id,
        "matches_permission_set": matched.matches_permission_set,
        "ambiguous_targets": matched.is_ambiguous(),
        "outcome": outcome,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
