use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kindred::catalog::{load_profile, seed_catalog, seed_profile, Catalog};
use kindred::config::Config;
use kindred::llm_client;
use kindred::matching::ranker::GeminiRanker;
use kindred::matching::service::MatchService;
use kindred::routes::build_router;
use kindred::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Kindred v{}", env!("CARGO_PKG_VERSION"));

    // Load catalog and profile (seed data unless paths are configured)
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)?,
        None => seed_catalog(),
    };
    let profile = match &config.profile_path {
        Some(path) => load_profile(path)?,
        None => seed_profile(),
    };
    info!(
        "Catalog ready: {} opportunities, profile '{}'",
        catalog.len(),
        profile.name
    );

    // Initialize ranker (no network calls without a key)
    let ranker = GeminiRanker::from_api_key(config.gemini_api_key.clone(), config.llm_timeout);
    if ranker.has_credential() {
        info!(
            "LLM client initialized (model: {}, timeout: {:?})",
            llm_client::MODEL,
            config.llm_timeout
        );
    }

    let matcher = MatchService::new(Arc::new(catalog), Arc::new(profile), Arc::new(ranker));

    // Build app state
    let state = AppState { matcher };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // the front-end is served from another origin in dev

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
