use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /create-invoice`.
///
/// Fields stay loosely typed so the relay can answer with its own 400s
/// instead of a generic deserialization rejection.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub init_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub invoice_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// JSON error body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `createInvoiceLink` payload in Bot API shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InvoiceLinkRequest {
    pub title: String,
    pub description: String,
    /// Opaque to the platform, echoed back on successful payment.
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: u64,
}

/// What the relay tucks into `InvoiceLinkRequest::payload`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DonationPayload {
    pub user_id: i64,
    pub amount: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Bot API envelope.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Server configuration error")]
    NotConfigured,
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Missing initData")]
    MissingInitData,
    #[error("Invalid Telegram data")]
    InvalidSignature,
    #[error("User data not found")]
    MissingUser,
    #[error("Invalid user data")]
    InvalidUser,
    #[error("Failed to create invoice")]
    Upstream { details: Option<String> },
    #[error("Internal server error")]
    Internal { message: String },
}

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            error: self.to_string(),
            details: None,
            message: None,
        };
        match self {
            ApiError::Upstream { details } => body.details = details.clone(),
            ApiError::Internal { message } => body.message = Some(message.clone()),
            _ => {}
        }
        body
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
