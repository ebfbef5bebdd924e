use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use stockroom_api as api;

use api::cache::{AppCache, CacheBackend, InMemoryCache, RedisCache};
use api::store::{InMemoryStore, TabularStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    info!(store_id = %cfg.store_id, environment = %cfg.environment, "starting stockroom-api");

    // The external tabular store adapter is wired per deployment; the
    // bundled in-memory store backs local runs and tests.
    let store: Arc<dyn TabularStore> = Arc::new(InMemoryStore::new());

    let cache_backend: Arc<dyn CacheBackend> = match cfg.cache.backend_kind() {
        api::config::CacheBackendKind::Redis => {
            match RedisCache::connect(&cfg.cache.redis_url).await {
                Ok(redis) => Arc::new(redis),
                Err(err) => {
                    warn!(error = %err, "redis cache unavailable, falling back to in-memory");
                    Arc::new(InMemoryCache::new())
                }
            }
        }
        api::config::CacheBackendKind::InMemory => Arc::new(InMemoryCache::new()),
    };
    let cache = AppCache::new(cache_backend);

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);
    let events = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    let services =
        api::handlers::AppServices::with_output_dir(store, cache, events, &cfg.output_dir);

    let state = api::AppState {
        config: cfg.clone(),
        services,
    };
    let app = api::app_router(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind_address()).await?;
    info!(address = %cfg.bind_address(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install terminate signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received terminate signal"),
    }
}
