pub mod handler;

use crate::config::{Config, MAX_PAYLOAD_BYTES};
use crate::gemini::AgingModel;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared handler state. `model` is `None` when the server started without
/// an API key; requests then fail with a generic 500 instead of crashing.
#[derive(Clone)]
pub struct AppState {
    pub model: Option<Arc<dyn AgingModel>>,
}

impl AppState {
    pub fn new(model: Option<Arc<dyn AgingModel>>) -> Self {
        Self { model }
    }

    /// Builds the state from configuration, constructing the Gemini client
    /// when a key is present. Its absence is logged, never echoed.
    pub fn from_config(config: &Config) -> Self {
        let model = config
            .gemini
            .clone()
            .and_then(|gemini| match crate::gemini::GeminiClient::new(gemini) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn AgingModel>),
                Err(e) => {
                    log::error!("❌ Model client unavailable: {}", e);
                    None
                }
            });

        Self { model }
    }
}

/// Builds the service router: `POST /api/generate` plus preflight, with
/// permissive CORS applied uniformly as a layer and the request body capped
/// at the transport ceiling.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/generate",
            post(handler::generate)
                .options(handler::preflight)
                .fallback(handler::method_not_allowed),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .with_state(state)
}
