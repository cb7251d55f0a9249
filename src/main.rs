//! Market Gateway - a crypto market data gateway
//!
//! Binary entry point: logging, configuration, background sweep and the HTTP
//! server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{signal, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use market_gateway::{
    create_router, spawn_sweep_task, AppState, Config, LogFormat, MarketDataService,
    SimulatedConnector,
};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Load and validate configuration from `GATEWAY_*` environment variables
/// 2. Initialize tracing (text or JSON per `GATEWAY_LOG_FORMAT`)
/// 3. Build the service, rate limiter and upstream connector
/// 4. Start the background sweep task
/// 5. Serve HTTP on the configured port until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    config.validate().context("invalid configuration")?;
    info!(
        port = config.server_port,
        ticker_ttl_secs = config.ticker_cache_ttl,
        cache_max_size = config.cache_max_size,
        rate_limit = config.rate_limit_requests,
        rate_limit_period_secs = config.rate_limit_period,
        "configuration loaded"
    );

    let connector = Arc::new(SimulatedConnector::default());
    let state = AppState::from_config(&config, connector);

    let sweep_handle = spawn_sweep_task(
        Arc::clone(&state.service),
        Arc::clone(&state.limiter),
        config.sweep_interval(),
        config.bucket_max_idle(),
    );

    let service = Arc::clone(&state.service);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("{} listening on http://{}", config.app_name, addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(sweep_handle, service))
    .await
    .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    // Defaults to info, can be overridden with RUST_LOG
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "market_gateway=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, aborts the sweep task and clears the caches.
async fn shutdown_signal(sweep_handle: JoinHandle<()>, service: Arc<MarketDataService>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    service.clear_caches();
    warn!("Sweep task aborted, caches cleared");
}
