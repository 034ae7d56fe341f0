//! Agua Sync Server
//!
//! Hosts the Remote Shared Document that every device syncs against.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AGUA_PORT`: Port to listen on (default: 8080)
//! - `AGUA_SERVER_DATA_DIR`: Directory holding `document.json`
//!   (default: ~/.local/share/agua-server)
//! - `AGUA_SYNC_TOKEN`: Shared bearer token; when unset the server accepts
//!   unauthenticated requests
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /document`, `PUT /document`: whole-document read and write
//! - `PUT /collections/{name}`: conditional collection write

use std::net::SocketAddr;
use std::path::PathBuf;

use agua_sync::server::{app, AppState, DocumentStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory to store the document
    data_dir: PathBuf,
    /// Shared bearer token
    token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("AGUA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("AGUA_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("agua-server")
            });

        let token = std::env::var("AGUA_SYNC_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            port,
            data_dir,
            token,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agua_server=info,agua_sync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let store = match DocumentStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open document store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Document file: {}", store.path().display());
    if config.token.is_none() {
        tracing::warn!("AGUA_SYNC_TOKEN is not set - accepting unauthenticated requests");
    }

    let app = app(AppState::new(store, config.token));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
