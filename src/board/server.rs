use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::api::{self, AppState, SharedState};
use super::source::{DEFAULT_LATENCY, InMemorySource, parse_inquiries};

/// Configuration for the board server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Delay applied before every store operation.
    pub latency: Duration,
    /// JSON file of inquiries to serve instead of the bundled seed.
    pub seed_path: Option<PathBuf>,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            latency: DEFAULT_LATENCY,
            seed_path: None,
            dev_mode: false,
        }
    }
}

impl ServerConfig {
    /// Dev mode listens on all interfaces.
    pub fn bind_addr(&self) -> String {
        let host = if self.dev_mode { "0.0.0.0" } else { &self.host };
        format!("{}:{}", host, self.port)
    }
}

/// Create the store the server will own.
pub fn build_state(config: &ServerConfig) -> Result<SharedState> {
    let store = match &config.seed_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            let inquiries = parse_inquiries(&json)
                .with_context(|| format!("Invalid seed file {}", path.display()))?;
            InMemorySource::new(inquiries, config.latency)
        }
        None => InMemorySource::seeded(config.latency).context("Invalid bundled seed data")?,
    };
    Ok(Arc::new(AppState {
        store: Arc::new(store),
    }))
}

/// Build the full application router.
pub fn build_router(state: SharedState, dev_mode: bool) -> Router {
    let app = api::api_router().with_state(state);
    if dev_mode {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Start the board server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = build_router(state, config.dev_mode);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        latency_ms = config.latency.as_millis() as u64,
        dev = config.dev_mode,
        "inquiry board server listening"
    );
    println!("Inquiry board running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
