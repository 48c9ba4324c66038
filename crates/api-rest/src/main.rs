//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without the workspace runner.
//!
//! ## Intended use
//! Development and debugging of the HTTP surface (with OpenAPI/Swagger UI). Configuration is the
//! same set of environment variables the `agrihealth-run` binary reads.

use agrihealth_core::{AppConfig, RawConfig};
use api_rest::{create_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = AppConfig::resolve(RawConfig::from_env())?;
    let state = AppState::from_config(&cfg)?;

    tracing::info!("-- Starting AgriHealth REST API on {}", cfg.rest_addr());

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
