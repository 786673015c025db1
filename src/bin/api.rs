use estate_intelligence::{
    api::{start_server, ApiState},
    concierge::SessionRegistry,
    config::AppConfig,
    gemini::{GeminiClient, GeminiResponder},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Estate Intelligence - API Server");
    info!("Port: {}", config.port);
    info!("Model: {}", config.gemini_model);

    let catalog = config.load_catalog()?;
    info!(
        "Catalog: {} plots, purchase years {:?}, horizon {}",
        catalog.plots.len(),
        catalog.purchase_years,
        catalog.growth_curve.horizon_year()
    );

    // Concierge responder; a missing key degrades replies instead of failing startup
    let responder = GeminiResponder::new(GeminiClient::from_config(&config)?)
        .with_history_turns(config.history_turns);
    let sessions = SessionRegistry::with_max_sessions(Arc::new(responder), config.max_sessions);
    info!(
        "Concierge: up to {} sessions, {} remembered turns each",
        config.max_sessions, config.history_turns
    );

    let state = ApiState::new(catalog, sessions);

    info!("Starting API server...");
    start_server(state, config.port).await?;

    Ok(())
}
