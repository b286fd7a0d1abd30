//! Small vault inspection tool.
//!
//! Commands:
//! - `callsheet list` -- list the project slugs known to the vault.
//! - `callsheet pull <slug>` -- print a project's snapshot summary.
//! - `callsheet registry` -- print the world registry.

mod config;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use callsheet_vault::client::VaultClient;
use callsheet_vault::credentials::{CredentialMinter, ServiceAccountKey};
use callsheet_vault::project::ProjectStore;
use callsheet_vault::registry::RegistrySynchronizer;

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callsheet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CliConfig::from_env();
    let key_json = std::fs::read_to_string(&config.key_file)
        .with_context(|| format!("Failed to read key file {}", config.key_file))?;
    let key = ServiceAccountKey::from_json(&key_json)?;

    let minter = CredentialMinter::new(key);
    let token = minter.mint().await.context("Token minting failed")?;
    tracing::info!(identity = %minter.client_email(), "Authenticated to vault");

    let client = VaultClient::with_base_url(config.bucket.clone(), config.base_url.clone());

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("list") => {
            let store = ProjectStore::new(client);
            let slugs = store.list_projects(&token.token).await?;
            if slugs.is_empty() {
                println!("No projects in the vault.");
            }
            for slug in slugs {
                println!("{slug}");
            }
        }
        Some("pull") => {
            let slug = args.next().context("Usage: callsheet pull <slug>")?;
            let store = ProjectStore::new(client);
            let snapshot = store.load_state(&token.token, &slug).await?;

            println!("{} -- {}", snapshot.slug, snapshot.title);
            println!(
                "{} shots, {} assets, {} scene plans, saved at {}",
                snapshot.shots.len(),
                snapshot.assets.len(),
                snapshot.scene_plans.len(),
                snapshot.saved_at
            );
            for (scene, ids) in snapshot.shots.scene_groups() {
                println!("  [{scene}] {}", ids.join(", "));
            }
            println!(
                "Estimated generation spend: ${:.2}",
                snapshot.usage.estimated_cost_usd()
            );
        }
        Some("registry") => {
            let registry = RegistrySynchronizer::new(client);
            let current = registry.fetch(&token.token).await?;
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        Some(other) => bail!("Unknown command '{other}'. Commands: list, pull, registry"),
        None => bail!("Usage: callsheet <list | pull <slug> | registry>"),
    }

    Ok(())
}
