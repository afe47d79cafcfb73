//! Troupe Server — HTTP backend for the troupe platform.
//!
//! A standalone Rust backend providing:
//! - RESTful HTTP API via axum
//! - SQLite persistence with rusqlite (via troupe-core)
//! - The supervisor workflow engine and architect (via troupe-core)
//!
//! This crate can be used standalone or embedded in other applications
//! (e.g. the troupe CLI's `server` subcommand).

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use troupe_core::db::Database;
use troupe_core::state::{AppState, AppStateInner};
use troupe_core::workflow::{EngineConfig, HttpGenerator, TextGenerator};

/// Configuration for the troupe backend server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Upper bound on supervisor↔specialist round trips per conversation.
    pub max_turns: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3720,
            db_path: "troupe.db".to_string(),
            max_turns: EngineConfig::default().max_turns,
        }
    }
}

/// Create a shared `AppState` from a database path.
///
/// The text-generation capability is resolved from the environment
/// (`ANTHROPIC_BASE_URL`, `ANTHROPIC_AUTH_TOKEN`/`ANTHROPIC_API_KEY`,
/// `ANTHROPIC_MODEL`). This is useful when you need to share the state
/// between the HTTP server and other consumers (e.g. CLI subcommands).
pub fn create_app_state(db_path: &str, max_turns: u32) -> Result<AppState, String> {
    let db = Database::open(db_path).map_err(|e| format!("Failed to open database: {}", e))?;

    let generator: Arc<dyn TextGenerator> = Arc::new(HttpGenerator::from_env());

    let state: AppState = Arc::new(AppStateInner::new(
        db,
        generator,
        EngineConfig { max_turns },
    ));
    Ok(state)
}

/// Start the troupe backend server.
///
/// Returns the actual address the server is listening on.
pub async fn start_server(config: ServerConfig) -> Result<SocketAddr, String> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "troupe_server=info,tower_http=info".into()),
        )
        .init();

    tracing::info!(
        "Starting troupe backend server on {}:{}",
        config.host,
        config.port
    );

    let state = create_app_state(&config.db_path, config.max_turns)?;

    start_server_with_state(config, state).await
}

/// Start the HTTP server with a pre-built `AppState`.
pub async fn start_server_with_state(
    config: ServerConfig,
    state: AppState,
) -> Result<SocketAddr, String> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api::api_router())
        .route("/api/health", axum::routing::get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    let local_addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get local address: {}", e))?;

    tracing::info!("troupe backend server listening on {}", local_addr);

    // Spawn the server in a background task
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local_addr)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "server": "troupe-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
