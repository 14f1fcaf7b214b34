//! Esports Calendar server binary.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use esports_calendar::api::{create_router, AppState};
use esports_calendar::cache::{Cache, MemoryTtlCache, NullCache, RedisCache};
use esports_calendar::config::{CacheBackend, Config};
use esports_calendar::source::PgSource;
use esports_calendar::spawn_cleanup_task;

/// Main entry point for the calendar server.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize tracing
/// 2. Load configuration from environment variables
/// 3. Connect the PostgreSQL pool
/// 4. Build the shared cache (falling back to no cache)
/// 5. Serve until SIGINT/SIGTERM, then drain within the grace period
/// 6. Close the pool and stop the sweep task
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "esports_calendar=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Esports Calendar server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        cache_backend = ?config.cache_backend,
        local_cache_capacity = config.local_cache_capacity,
        preview_limit = config.preview_limit,
        "Configuration loaded"
    );

    let source = Arc::new(
        PgSource::connect(&config.database_url, config.db_max_connections)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );

    let (shared, cleanup_handle) = build_shared_cache(&config).await;
    info!(backend = shared.name(), "Shared cache ready");

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let state = AppState::new(source.clone(), source.clone(), shared, config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("Server error")?,
        _ = signalled_rx => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result.context("Server error")?,
                Err(_) => warn!(grace_secs = grace.as_secs(), "Grace period elapsed, dropping in-flight requests"),
            }
        }
    }

    source.close().await;
    if let Some(handle) = cleanup_handle {
        handle.abort();
        info!("Cleanup task aborted");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured shared cache.
///
/// An unreachable Redis is not fatal: the server runs without a shared cache
/// and every request recomputes from the database.
async fn build_shared_cache(config: &Config) -> (Arc<dyn Cache>, Option<JoinHandle<()>>) {
    match config.cache_backend {
        CacheBackend::Redis => {
            let connected =
                RedisCache::connect(&config.redis_url, &config.redis_key_prefix, config.data_ttl())
                    .await;
            let cache: Arc<dyn Cache> = match connected {
                Ok(cache) => Arc::new(cache),
                Err(err) => {
                    error!(error = %err, "Failed to initialize Redis cache, continuing without cache");
                    Arc::new(NullCache)
                }
            };
            (cache, None)
        }
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryTtlCache::new(config.data_ttl()));
            let handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);
            let cache: Arc<dyn Cache> = cache;
            (cache, Some(handle))
        }
        CacheBackend::None => {
            warn!("Shared cache disabled by configuration");
            let cache: Arc<dyn Cache> = Arc::new(NullCache);
            (cache, None)
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
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
}
