//! Standalone reference server binary.
//!
//! ## Purpose
//! Serves the record API from memory so the `ward` CLI can be exercised without a real backend.
//! Data is lost when the process exits.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_api_rest::{router, AppState};

/// Environment variable holding the listen address.
const REST_ADDR_ENV: &str = "WARD_REST_ADDR";
const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Main entry point for the Ward reference server.
///
/// # Environment Variables
/// - `WARD_REST_ADDR`: Server address (default: "0.0.0.0:3000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ward_api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var(REST_ADDR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into());

    tracing::info!("-- Starting Ward REST API on {}", addr);

    let app = router(AppState::default());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
