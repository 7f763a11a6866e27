//! Hosted checkout session client.
//!
//! Creates checkout sessions on the payment provider's API. The shop never
//! touches card data: each checkout maps the cart to line items, posts them
//! form-encoded to `/v1/checkout/sessions`, and hands the opaque session id
//! back to the browser. Failures carry the provider's message and are never
//! retried here; no idempotency key is attached, so resubmitting creates a
//! fresh session.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use curio_core::CurrencyCode;

use crate::config::PaymentConfig;
use crate::models::Product;

/// Errors that can occur when creating a checkout session.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("payment provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// One cart entry as submitted to the provider.
///
/// Every piece is unique stock, so quantity is always 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Display name shown on the hosted checkout page.
    pub name: String,
    /// Product image shown alongside the name.
    pub image_url: String,
    /// Price in the currency's minor unit (pence).
    pub unit_amount: i64,
}

impl From<&Product> for LineItem {
    fn from(product: &Product) -> Self {
        Self {
            name: product.title.clone(),
            image_url: product.image_url.clone(),
            unit_amount: product.price.minor_units(),
        }
    }
}

/// An open checkout session on the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Opaque provider session id, handed to the browser-side redirect.
    pub id: String,
}

/// Provider error payload (`{"error": {"message": "..."}}`).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Payment provider API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    api_url: String,
    secret_key: SecretString,
    currency: CurrencyCode,
}

impl PaymentClient {
    /// Create a new payment client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
            currency: config.currency,
        })
    }

    /// Create a hosted checkout session for the given line items.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` with the provider's message if the
    /// provider rejects the submission, `PaymentError::Http` if the request
    /// itself fails.
    pub async fn create_checkout_session(
        &self,
        line_items: &[LineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.api_url);
        let fields = session_form_fields(self.currency, line_items, success_url, cancel_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Build the form-encoded session-create request body.
fn session_form_fields(
    currency: CurrencyCode,
    line_items: &[LineItem],
    success_url: &str,
    cancel_url: &str,
) -> Vec<(String, String)> {
    let mut fields = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), success_url.to_owned()),
        ("cancel_url".to_owned(), cancel_url.to_owned()),
    ];

    for (i, item) in line_items.iter().enumerate() {
        fields.push((format!("line_items[{i}][quantity]"), "1".to_owned()));
        fields.push((
            format!("line_items[{i}][price_data][currency]"),
            currency.code().to_owned(),
        ));
        fields.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        fields.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        fields.push((
            format!("line_items[{i}][price_data][product_data][images][0]"),
            item.image_url.clone(),
        ));
    }

    fields
}

/// Turn a provider error response into a `PaymentError`, preferring the
/// structured message over the raw body.
fn api_error(status: StatusCode, body: String) -> PaymentError {
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map_or(body, |parsed| parsed.error.message);

    PaymentError::Api {
        status: status.as_u16(),
        message,
    }
}
