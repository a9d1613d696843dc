// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::aggregator::PlatformAggregator;
use crate::application::artifact_source::{ArchiveExtractor, ArtifactSource, ReportParser};
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::run_selector::RunSelector;
use crate::application::stores::{CredentialStore, StateStore};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::file_store::{FileCredentialStore, JsonFileStateStore};
use crate::infrastructure::github_client::GitHubClient;
use crate::infrastructure::junit_parser::JunitXmlParser;
use crate::infrastructure::zip_extractor::ZipExtractor;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config().context("loading configuration")?;
    let android = config.android.platform_config()?;
    let ios = config.ios.platform_config()?;

    // Adapters (infrastructure layer)
    let source: Arc<dyn ArtifactSource> = Arc::new(GitHubClient::new(&config.github)?);
    let extractor: Arc<dyn ArchiveExtractor> = Arc::new(ZipExtractor);
    let parser: Arc<dyn ReportParser> = Arc::new(JunitXmlParser);
    let state_store: Arc<dyn StateStore> =
        Arc::new(JsonFileStateStore::new(config.storage.state_path()));
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(config.storage.token_path()));

    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.trim().is_empty() {
            credentials
                .set(&token)
                .await
                .context("storing GITHUB_TOKEN")?;
            tracing::info!("credential seeded from GITHUB_TOKEN");
        }
    }

    // Services (application layer)
    let selector = RunSelector::new(
        source.clone(),
        config.nightly.workflow_name.clone(),
        config.nightly.max_candidates,
    );
    let aggregator = PlatformAggregator::new(
        selector,
        source.clone(),
        extractor.clone(),
        parser.clone(),
        config.github.max_concurrent_downloads,
    );
    let dashboard_service = DashboardService::new(
        android,
        ios,
        aggregator,
        config.combiner(),
        source,
        extractor,
        parser,
    );

    let scheduler = Arc::new(RefreshScheduler::new(
        dashboard_service.clone(),
        state_store,
        credentials.clone(),
    ));
    scheduler.restore().await;
    scheduler
        .clone()
        .spawn(config.refresh.interval, config.refresh.enabled);

    // Create application state
    let state = Arc::new(AppState {
        scheduler,
        dashboard_service,
        credentials,
    });

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_address))?;
    tracing::info!(%addr, "starting nightly-dashboard service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
