//! # Cartwatch — Abandoned Cart Tracker
//!
//! Tracks storefront carts and sends the ones that never reach checkout
//! to Zoho CRM as leads.
//!
//! Usage:
//!   cartwatch                              # Start with ~/.cartwatch/config.toml
//!   cartwatch --config ./cartwatch.toml    # Custom config file
//!   cartwatch --port 8080 --verbose

use anyhow::{Context, Result};
use cartwatch_core::CartwatchConfig;
use cartwatch_crm::ZohoClient;
use cartwatch_scheduler::{CartTracker, Timings};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cartwatch",
    version,
    about = "🛒 Cartwatch — abandoned cart tracker for Zoho CRM"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "CARTWATCH_CONFIG")]
    config: Option<String>,

    /// HTTP port (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cartwatch=debug,cartwatch_scheduler=debug,cartwatch_crm=debug,cartwatch_gateway=debug,tower_http=debug"
    } else {
        "cartwatch=info,cartwatch_scheduler=info,cartwatch_crm=info,cartwatch_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = match cli.config.as_deref() {
        Some(path) => {
            let path = expand_path(path);
            CartwatchConfig::load_from(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => CartwatchConfig::load().context("loading default config")?,
    };
    config.apply_env_overrides()?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    config.validate()?;

    if config.crm.refresh_token.is_empty() {
        tracing::warn!("⚠️ No Zoho refresh token configured; expired access tokens cannot be renewed");
    }

    let timings = Timings::from(&config.tracking);
    tracing::info!(
        "⏰ Grace period {}s, retention {}s",
        timings.grace_period.as_secs(),
        timings.retention.as_secs()
    );

    let sink = Arc::new(ZohoClient::from_config(&config.crm));
    let tracker = CartTracker::new(sink, timings);

    cartwatch_gateway::start(&config.gateway, tracker).await
}
