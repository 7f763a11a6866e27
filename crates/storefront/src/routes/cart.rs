//! Cart and checkout handlers.
//!
//! Adding to the cart places an exclusive hold on the piece; checkout turns
//! the held pieces into a hosted payment session. The provider redirects
//! back to `/success`, which is the completion signal that marks the holds
//! paid: the scoped provider contract offers no webhook, so the redirect is
//! authoritative here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use curio_core::ProductId;

use crate::db::RepositoryError;
use crate::db::reservations::ReservationRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireCustomer;
use crate::models::CurrentCustomer;
use crate::services::listing::cart_total;
use crate::services::payments::LineItem;
use crate::state::AppState;

/// Query parameter naming the product to hold or release.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub product_id: ProductId,
}

/// A cart row as rendered on the cart page.
pub struct CartItem {
    pub product_id: i32,
    pub title: String,
    pub price_display: String,
    pub image_url: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub customer: Option<CurrentCustomer>,
    pub items: Vec<CartItem>,
    pub total_display: String,
}

/// Checkout confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "success.html")]
pub struct SuccessTemplate {
    pub customer: Option<CurrentCustomer>,
    pub item_count: u64,
}

/// Display the cart with its total.
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<CartTemplate> {
    let products = ReservationRepository::new(state.pool())
        .products_reserved_by(customer.id, state.claim_cutoff())
        .await?;

    let currency = state.config().payment.currency;
    let total_display = cart_total(&products).display(currency);
    let items = products
        .into_iter()
        .map(|p| CartItem {
            product_id: p.id.as_i32(),
            title: p.title,
            price_display: p.price.display(currency),
            image_url: p.image_url,
        })
        .collect();

    Ok(CartTemplate {
        customer: Some(customer),
        items,
        total_display,
    })
}

/// Place a hold on a product for the current customer.
///
/// If someone else already holds the piece the listing shows a message;
/// losing the race is an ordinary outcome here, not a server error.
pub async fn add(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    let ledger = ReservationRepository::new(state.pool());

    match ledger
        .reserve(query.product_id, customer.id, state.claim_cutoff())
        .await
    {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(RepositoryError::Conflict(_)) => Ok(Redirect::to("/?error=claimed").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!(
            "product {}",
            query.product_id
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Release the current customer's own hold on a product.
pub async fn remove(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    Query(query): Query<ProductQuery>,
) -> Result<Response> {
    ReservationRepository::new(state.pool())
        .release(query.product_id, customer.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("no hold on product {}", query.product_id))
            }
            other => other.into(),
        })?;

    Ok(Redirect::to("/cart").into_response())
}

/// Create a hosted checkout session for the current cart.
///
/// Responds with the provider's opaque session id as JSON; the browser
/// redirects to the provider with it.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    let products = ReservationRepository::new(state.pool())
        .products_reserved_by(customer.id, state.claim_cutoff())
        .await?;

    if products.is_empty() {
        return Err(AppError::Validation("your cart is empty".to_owned()));
    }

    let line_items: Vec<LineItem> = products.iter().map(LineItem::from).collect();

    let base_url = state.config().base_url.trim_end_matches('/');
    let success_url = format!("{base_url}/success");
    let cancel_url = format!("{base_url}/cart");

    let session = state
        .payments()
        .create_checkout_session(&line_items, &success_url, &cancel_url)
        .await?;

    tracing::info!(
        customer_id = %customer.id,
        items = line_items.len(),
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(json!({ "id": session.id })).into_response())
}

/// Checkout completion callback.
///
/// Marks the customer's held pieces as paid and renders the confirmation.
/// Reloading the page finds nothing left to mark and renders the same
/// confirmation with zero items.
pub async fn success(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<SuccessTemplate> {
    let item_count = ReservationRepository::new(state.pool())
        .mark_paid(customer.id, state.claim_cutoff())
        .await?;

    if item_count > 0 {
        tracing::info!(customer_id = %customer.id, item_count, "Checkout completed");
    }

    Ok(SuccessTemplate {
        customer: Some(customer),
        item_count,
    })
}
