//! ns-provision: stand up a tenant on a hosted telephony platform.
//!
//! Every resource is created with a POST and, when the platform reports that
//! it already exists, updated with a PUT of the same body, so a run can be
//! repeated safely. Branding images are fetched with backoff on rate
//! limiting and resized locally before upload.

#![warn(clippy::all)]

mod api;
mod assets;
mod cli;
mod config;
mod provision;
mod resources;
mod retry;
#[cfg(test)]
mod testing;
mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use assets::ImageFetcher;
use config::{Action, Config};
use provision::{create_progress_bar, Provisioner};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Log to the terminal, and also to `log_file` without colours when given.
fn init_tracing(level: types::LogLevel, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("ns-provision/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch and resize only; nothing is sent to the platform.
async fn run_derive(job: &provision::ImageJob) -> anyhow::Result<()> {
    let http = http_client()?;
    let fetcher = ImageFetcher::new(&http, job.retry.clone());
    let assets = fetcher
        .fetch_and_derive(&job.source, &job.sizes, &job.out_dir)
        .await?;
    for asset in assets.iter() {
        println!("{}", asset.path.display());
    }
    tracing::info!(count = assets.len(), dir = %job.out_dir.display(), "derived image variants");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();

    let log_file = cli
        .log_file
        .as_deref()
        .map(|p| config::expand_tilde(&p.to_string_lossy()));
    init_tracing(cli.log_level, log_file.as_deref())?;

    // The token prompt blocks on stdin.
    let config = tokio::task::block_in_place(|| Config::from_cli(cli))?;
    tracing::debug!(?config, "resolved configuration");

    let api = match (&config.action, config.api) {
        (Action::Derive(job), _) => return run_derive(job).await,
        (_, Some(api)) => api,
        (_, None) => anyhow::bail!("No API configuration for this command"),
    };
    tracing::info!(server = api.server(), "Starting ns-provision");

    let client = ApiClient::new(api, Box::new(http_client()?));
    let mut provisioner =
        Provisioner::new(&client, create_progress_bar(config.no_progress_bar));

    match &config.action {
        Action::Provision(plan) => provisioner.run(plan).await,
        Action::Reseller(reseller) => provisioner.reseller(reseller).await,
        Action::Domain(domain) => provisioner.domain(domain).await,
        Action::User {
            domain,
            entry,
            device,
        } => {
            provisioner
                .users(domain, std::slice::from_ref(entry), *device)
                .await
        }
        Action::Device(device) => {
            provisioner
                .publish_all(std::slice::from_ref(device))
                .await
        }
        Action::Connections(connections) => provisioner.connections(connections).await,
        Action::Route(route) => provisioner.route(route).await,
        Action::UiConfigs(configs) => provisioner.ui_configs(configs).await,
        Action::Images(job) => provisioner.images(job).await,
        Action::Training => provisioner.training_domains().await,
        Action::Derive(_) => {}
    }

    let summary = provisioner.finish();
    summary.log();
    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
