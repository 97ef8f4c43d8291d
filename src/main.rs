use std::sync::Arc;

use clap::Parser;
use credit_health_client::client::CreditApiClient;
use credit_health_client::config::Config;
use credit_health_client::orchestrator::{FetchOrchestrator, ViewPhase};
use credit_health_client::render;
use credit_health_client::session::StaticIdentity;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal view of a client's credit health dashboard.
#[derive(Debug, Parser)]
#[command(name = "credit-dashboard", version)]
struct Cli {
    /// Client identifier; overrides the stored CLIENT_ID.
    #[arg(long)]
    client_id: Option<String>,

    /// Profile edit as `field=value` (e.g. `interestRate=4.5`). Repeatable.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    edits: Vec<String>,

    /// Persist the edits and reload the dashboard.
    #[arg(long)]
    save: bool,
}

/// Main entry point for the dashboard client.
///
/// Loads configuration, resolves the session identity, runs the dashboard
/// load and prints it. With `--set`/`--save` the edited profile is shown and
/// optionally persisted.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_health_client=info,credit_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let stored = cli.client_id.as_deref().or(config.client_id.as_deref());
    let identity = Arc::new(StaticIdentity::from_stored(stored));
    let client = CreditApiClient::new(&config)?;
    let orchestrator = FetchOrchestrator::new(client, identity);

    let phase = orchestrator.load().await;
    print!("{}", render::render_dashboard(&orchestrator.state()));

    if phase == ViewPhase::RedirectToLogin {
        std::process::exit(2);
    }
    if phase != ViewPhase::Ready || cli.edits.is_empty() {
        return Ok(());
    }

    let Some(mut buffer) = orchestrator.edit_buffer() else {
        return Ok(());
    };
    for edit in &cli.edits {
        let Some((key, value)) = edit.split_once('=') else {
            anyhow::bail!("invalid edit '{}', expected FIELD=VALUE", edit);
        };
        if !buffer.set_by_key(key.trim(), value.trim()) {
            tracing::warn!("Unknown profile field '{}' ignored", key.trim());
        }
    }

    if let Some(profile) = orchestrator.state().profile {
        println!("\n-- Pending edits --");
        print!("{}", render::render_profile(&profile, &buffer));
    }

    if cli.save {
        match orchestrator.save_profile(&mut buffer).await {
            Ok(prepared) => {
                for field in &prepared.rejected {
                    eprintln!("Skipped {}: value is not a number", field.label());
                }
                println!("\nProfile saved.\n");
                print!("{}", render::render_dashboard(&orchestrator.state()));
            }
            Err(e) if e.is_session_invalid() => {
                tracing::warn!("Profile save needs a new session: {}", e);
                std::process::exit(2);
            }
            Err(e) => {
                tracing::error!("Profile save failed: {}", e);
                anyhow::bail!("profile save failed, edits kept: {}", e);
            }
        }
    }

    Ok(())
}
