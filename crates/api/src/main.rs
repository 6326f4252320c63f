//! PegVault sandbox API server binary entrypoint.

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use pegvault_common::config::AppConfig;
use pegvault_oracle::poller::FeedPoller;

use pegvault_api::routes::create_router;
use pegvault_api::state::AppState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pegvault_api=debug,pegvault_engine=debug,pegvault_oracle=info,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting PegVault API server...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let listen_addr = config.listen_addr;

    // Build application state
    let state = AppState::sandbox(config.clone())?;
    tracing::info!(
        collateral_assets = config.collateral_tokens.len(),
        seeded_prices = config.seed_prices.len(),
        faucet = config.faucet_enabled,
        "Engine ready"
    );

    // Follow on-chain feeds when an RPC endpoint is configured
    if let Some(rpc_url) = config.price_rpc_url.clone() {
        let mut poller = FeedPoller::new(
            rpc_url,
            config.price_poll_interval_ms,
            config.price_feeds.clone(),
            state.prices.clone(),
        )
        .with_default_decimals(config.price_feed_decimals);

        tokio::spawn(async move {
            if let Err(e) = poller.run().await {
                tracing::error!(error = %e, "Feed poller stopped");
            }
        });
    } else {
        tracing::info!("PRICE_RPC_URL not set, serving static seed prices");
    }

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    tracing::info!("API server listening on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
