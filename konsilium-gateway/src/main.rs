use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use konsilium_gateway::providers::{OllamaClient, Provider};
use konsilium_gateway::server;
use konsilium_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; invalid chunk parameters and the like are fatal
    // here, before anything touches the index.
    let settings = konsilium_core::Settings::load()?;
    info!(
        "Configuration loaded (generation model: {}, embedding model: {})",
        settings.generation.model, settings.knowledge.embedding_model
    );

    // Open the guideline index.
    let knowledge = Arc::new(konsilium_knowledge::KnowledgeEngine::open(settings.knowledge.clone()).await?);
    let stats = knowledge.stats().await?;
    info!(
        "Guideline index ready: {} segments across {} domains",
        stats.total_segments,
        stats.per_domain.len()
    );
    if stats.total_segments == 0 {
        warn!("Guideline index is empty; answers will be ungrounded until `konsilium-cli ingest` runs");
    }

    // Generation provider. An unreachable provider is not fatal: specialists
    // degrade to readable error answers and /health reports it.
    let provider: Arc<dyn Provider> = Arc::new(OllamaClient::new(
        &settings.generation.base_url,
        &settings.generation.model,
        settings.generation.timeout_seconds,
    ));
    match provider.health().await {
        Ok(()) => info!("Generation provider reachable (model: {})", provider.model()),
        Err(e) => warn!("Generation provider not reachable at startup: {e}"),
    }

    if settings.gateway.host != "127.0.0.1" && settings.gateway.host != "localhost" {
        warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            settings.gateway.host
        );
    }

    let bind_addr = settings.bind_addr();
    let state = Arc::new(AppState::new(settings, provider, knowledge));

    info!("Starting KONSILIUM gateway on {}", bind_addr);
    server::run(state, &bind_addr).await
}
