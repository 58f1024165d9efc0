pub mod bot_api;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use crate::bot_api::{BotApi, BotApiError};
pub use crate::config::Config;
pub use crate::error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub bot_token: Option<String>,
    pub bot_api: BotApi,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_token: config.bot_token().map(str::to_owned),
            bot_api: BotApi::new(&config.api_base),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/create-invoice", post(routes::create_invoice))
        .route("/health", get(routes::health))
        .with_state(Arc::new(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
