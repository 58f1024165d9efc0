use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use spinner_shared::ApiError;
use tracing::error;

use crate::bot_api::BotApiError;

/// Wraps [`ApiError`] so handlers can return it directly.
#[derive(Debug)]
pub struct ErrorResponse(pub ApiError);

impl ErrorResponse {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ApiError::InvalidBody
            | ApiError::InvalidAmount
            | ApiError::MissingInitData
            | ApiError::MissingUser
            | ApiError::InvalidUser => StatusCode::BAD_REQUEST,
            ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::NotConfigured | ApiError::Upstream { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<BotApiError> for ErrorResponse {
    fn from(err: BotApiError) -> Self {
        match err {
            BotApiError::Rejected(details) => Self(ApiError::Upstream { details }),
            BotApiError::Transport(e) => {
                error!(error = %e, "bot_api_transport");
                Self(ApiError::Internal {
                    message: e.to_string(),
                })
            }
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.body())).into_response()
    }
}
