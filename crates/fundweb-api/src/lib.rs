//! HTTP JSON API for fund initiatives
//!
//! Routes are organized into modules:
//! - routes::initiatives: initiative list, detail, creation and edits
//! - routes::settings: configuration display and editor metadata

pub mod error;
pub mod routes;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use fundweb_config::Config;
use fundweb_core::{FundStore, StoreSummary};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<FundStore>>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::initiatives::{
        api_initiative_create, api_initiative_detail, api_initiative_edit, api_initiative_transactions,
        api_initiatives,
    };
    use routes::settings::{api_editor, api_settings};

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/summary", get(api_summary))
        .route("/api/settings", get(api_settings))
        .route("/api/editor", get(api_editor))
        .route("/api/initiatives", get(api_initiatives).post(api_initiative_create))
        .route("/api/initiatives/:phid", get(api_initiative_detail))
        .route(
            "/api/initiatives/:phid/transactions",
            get(api_initiative_transactions).post(api_initiative_edit),
        )
        .route("/api/reload", post(api_reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn api_summary(State(state): State<AppState>) -> Json<StoreSummary> {
    let store = state.store.read().await;
    Json(store.summary())
}

/// Reload the store from its seed file
async fn api_reload(State(state): State<AppState>) -> Result<Json<StoreSummary>, ApiError> {
    let mut store = state.store.write().await;
    store.reload().await?;
    Ok(Json(store.summary()))
}

/// Bind and serve until the server stops
pub async fn start_server(config: Config, store: Arc<RwLock<FundStore>>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { store, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting fundweb server on http://{}", addr);
    log::info!("  - /api/initiatives (initiatives and their transactions)");
    log::info!("  - /api/editor (accepted transaction types)");

    axum::serve(listener, router).await?;
    log::info!("Server stopped gracefully");
    Ok(())
}
