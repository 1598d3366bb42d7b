//! HTTP relays to the hosted image APIs.
//!
//! | Route | Handler | Upstream |
//! |---|---|---|
//! | `POST /api/ai-generation` | [`generation::generate_image`] | images API (JSON) |
//! | `POST /api/recognition` | [`recognition::recognize`] | chat completions API (JSON, inline image) |
//! | `POST /api/remove-bg` | [`remove_bg::remove_background`] | remove.bg (multipart → binary) |
//! | `GET /api/remove-bg` | [`remove_bg::health`] | none |
//!
//! Every relay walks the same steps: credential present → required field
//! present → reshape → one outbound call ([`upstream::send`]) → normalized
//! result. Requests share nothing mutable; the only shared piece is the
//! `reqwest::Client` connection pool.

pub mod error;
pub mod form;
pub mod generation;
pub mod recognition;
pub mod remove_bg;
pub mod upstream;

use crate::config::{AppConfig, Credentials};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{GatewayError, GatewayResult};

pub const GENERATION_ROUTE: &str = "/api/ai-generation";
pub const RECOGNITION_ROUTE: &str = "/api/recognition";
pub const REMOVE_BG_ROUTE: &str = "/api/remove-bg";

/// State shared by all handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<Credentials>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build state with a default outbound client (platform timeouts, no retry).
    pub fn new(config: AppConfig, credentials: Credentials) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("imgdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(config, credentials, http))
    }

    pub fn with_client(config: AppConfig, credentials: Credentials, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            http,
        }
    }
}

/// The gateway router with tracing and the configured body limit applied.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;
    Router::new()
        .route(GENERATION_ROUTE, post(generation::generate_image))
        .route(RECOGNITION_ROUTE, post(recognition::recognize))
        .route(
            REMOVE_BG_ROUTE,
            get(remove_bg::health).post(remove_bg::remove_background),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        generation = state.credentials.ark.is_some(),
        remove_bg = state.credentials.remove_bg.is_some(),
        "gateway listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
