use agrihealth_core::{AppConfig, RawConfig};
use api_rest::{create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AgriHealth service
///
/// Resolves configuration once, composes the report generator, store and identity provider it
/// selects, and serves the REST API until interrupted.
///
/// # Environment Variables
/// - `AGRIHEALTH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `AGRIHEALTH_GENERATOR`: `static`, `remote` or `gemini` (default: `static`)
/// - `AGRIHEALTH_PERSISTENCE`: `persist` or `preview` (default: `persist`)
/// - `AGRIHEALTH_BACKEND`: `memory` or `hosted` (default: `memory`)
/// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`: hosted backend connection
/// - `SOIL_ANALYSIS_FUNCTION_URL`: delegated generator endpoint
/// - `GEMINI_API_KEY`, `GEMINI_API_URL`: upstream text-generation API
/// - `AGRIHEALTH_HTTP_TIMEOUT_SECS`: timeout for outbound calls (default: 30)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or incomplete for the selected variants,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agrihealth_run=info".parse()?)
                .add_directive("agrihealth_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::resolve(RawConfig::from_env())?;
    let state = AppState::from_config(&cfg)?;
    let app = create_router(state);

    tracing::info!("++ Starting AgriHealth REST on {}", cfg.rest_addr());

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- AgriHealth REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
