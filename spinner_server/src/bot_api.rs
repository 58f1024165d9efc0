//! Minimal Bot API client: only `createInvoiceLink` is needed.

use spinner_shared::{BotApiResponse, InvoiceLinkRequest};
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum BotApiError {
    /// The Bot API answered `ok: false`.
    #[error("bot api rejected the call: {}", .0.as_deref().unwrap_or("no description"))]
    Rejected(Option<String>),
    #[error("bot api request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct BotApi {
    http: reqwest::Client,
    base_url: String,
}

impl BotApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, bot_token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, bot_token, method)
    }

    /// Returns the invoice link on success.
    pub async fn create_invoice_link(
        &self,
        bot_token: &str,
        invoice: &InvoiceLinkRequest,
    ) -> Result<String, BotApiError> {
        debug!(currency = %invoice.currency, "bot_api_create_invoice_link");

        // the URL embeds the token, keep it out of errors and logs
        let response = self
            .http
            .post(self.method_url(bot_token, "createInvoiceLink"))
            .json(invoice)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        // the Bot API reports failures as `ok: false` with a 4xx status, so
        // the envelope is parsed whatever the status
        let status = response.status();
        let envelope = response
            .json::<BotApiResponse<String>>()
            .await
            .map_err(|e| e.without_url())?;

        match envelope {
            BotApiResponse {
                ok: true,
                result: Some(link),
                ..
            } => Ok(link),
            BotApiResponse { description, .. } => {
                error!(%status, description = ?description, "bot_api_error");
                Err(BotApiError::Rejected(description))
            }
        }
    }
}
