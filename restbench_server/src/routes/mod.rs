//! Route handlers for the restbench server

pub mod history;

use crate::{
    config::{Config, CorsPolicy},
    service::HistoryService,
    store::Store,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub history: HistoryService,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            history: HistoryService::new(store),
        }
    }
}

/// Build the CORS layer for the configured policy
pub fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Permissive => CorsLayer::permissive(),
        CorsPolicy::Origin(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(history::router());

    // Serve a built frontend, falling back to its index for client-side routes
    if let Some(dir) = &state.config.static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors))
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.history.store();
    let db_ok = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            false
        }
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if db_ok { "healthy" } else { "degraded" },
            "db": if db_ok { "ok" } else { "error" },
            "store": store.kind(),
        })),
    )
}
