use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jollydash::{
    app::AppState,
    broadcast,
    config::ServerConfig,
    sync::{GameStore, MemoryStore, SyncController},
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jollydash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting JollyDash...");

    let config = ServerConfig::from_env();
    if !config.sync.allow_writes {
        tracing::warn!("Live writes are disabled, screens will be read-only");
    }

    let store: Arc<dyn GameStore> = match &config.snapshot_path {
        Some(path) => match MemoryStore::with_snapshot(path).await {
            Ok(store) => {
                tracing::info!("Persisting game record to {}", path.display());
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!("Failed to open snapshot {}: {}", path.display(), e);
                return;
            }
        },
        None => Arc::new(MemoryStore::new()),
    };

    let controller = Arc::new(SyncController::new(store, config.sync.clone()));
    if let Err(e) = controller.init().await {
        tracing::error!("Failed to subscribe to store: {}", e);
        return;
    }

    if config.create_on_start && controller.current().is_none() {
        match controller.create_game().await {
            Ok(_) => tracing::info!("Created default game"),
            Err(e) => tracing::warn!("Could not create default game: {}", e),
        }
    }

    let state = Arc::new(AppState::new(controller));

    // Spawn background task forwarding state changes to every screen
    broadcast::spawn_state_broadcaster(state.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
