use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use spinner_core::{InitData, InitDataError};
use spinner_shared::{
    ApiError, ApiResult, CreateInvoiceRequest, CreateInvoiceResponse, DonationPayload,
    HealthResponse, InvoiceLinkRequest, LabeledPrice,
};
use tracing::{error, info, warn};

use crate::error::ErrorResponse;
use crate::AppState;

pub const INVOICE_TITLE: &str = "Support Decision Spinner";
pub const INVOICE_CURRENCY: &str = "XTR";
pub const PRICE_LABEL: &str = "Donation";

/// Largest integer a JSON number carries without losing precision.
const MAX_SAFE_AMOUNT: f64 = 9_007_199_254_740_991.0;

/// Stars are whole units. Any positive whole number is accepted, so `100.0`
/// counts as `100`.
pub fn parse_amount(raw: Option<&Value>) -> ApiResult<u64> {
    raw.and_then(Value::as_f64)
        .filter(|n| n.fract() == 0.0 && *n > 0.0 && *n <= MAX_SAFE_AMOUNT)
        .map(|n| n as u64)
        .ok_or(ApiError::InvalidAmount)
}

pub fn build_invoice(user_id: i64, amount: u64, timestamp_ms: i64) -> ApiResult<InvoiceLinkRequest> {
    let payload = serde_json::to_string(&DonationPayload {
        user_id,
        amount,
        timestamp: timestamp_ms,
    })
    .map_err(|e| ApiError::Internal {
        message: e.to_string(),
    })?;
    Ok(InvoiceLinkRequest {
        title: INVOICE_TITLE.to_string(),
        description: format!("Thank you for supporting the app with {amount} stars!"),
        payload,
        currency: INVOICE_CURRENCY.to_string(),
        prices: vec![LabeledPrice {
            label: PRICE_LABEL.to_string(),
            amount,
        }],
    })
}

pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<Json<CreateInvoiceResponse>, ErrorResponse> {
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "create_invoice: unreadable body");
        ApiError::InvalidBody
    })?;

    let Some(bot_token) = state.bot_token.as_deref() else {
        error!("BOT_TOKEN not configured");
        return Err(ApiError::NotConfigured.into());
    };

    let amount = parse_amount(req.amount.as_ref())?;
    let raw = req
        .init_data
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingInitData)?;

    let init_data = InitData::parse(raw);
    if !init_data.is_signed_by(bot_token) {
        warn!("create_invoice: init data failed verification");
        return Err(ApiError::InvalidSignature.into());
    }

    let user = init_data.user().map_err(|e| match e {
        InitDataError::MissingUser => ApiError::MissingUser,
        _ => ApiError::InvalidUser,
    })?;

    let invoice = build_invoice(user.id, amount, Utc::now().timestamp_millis())?;
    let invoice_url = state.bot_api.create_invoice_link(bot_token, &invoice).await?;

    info!(user_id = user.id, amount, "invoice created");
    Ok(Json(CreateInvoiceResponse { invoice_url }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}
