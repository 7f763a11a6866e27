//! Product listing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::db::catalog::ProductRepository;
use crate::error::Result;
use crate::middleware::OptionalCustomer;
use crate::models::CurrentCustomer;
use crate::services::listing::{self, VisibleProduct};
use crate::state::AppState;

/// Query parameters for message display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// A product as rendered on the listing.
pub struct ProductCard {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price_display: String,
    pub image_url: String,
    pub in_cart: bool,
    pub purchased: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub customer: Option<CurrentCustomer>,
    pub is_admin: bool,
    pub products: Vec<ProductCard>,
    pub message: Option<String>,
}

/// Display the product listing for the current viewer.
///
/// Products claimed by someone else are hidden; the viewer's own holds are
/// flagged so the page can render them as in-cart.
pub async fn index(
    State(state): State<AppState>,
    OptionalCustomer(customer): OptionalCustomer,
    Query(query): Query<MessageQuery>,
) -> Result<IndexTemplate> {
    let rows = ProductRepository::new(state.pool())
        .list_with_claims(state.claim_cutoff())
        .await?;

    let viewer = customer.as_ref().map(|c| c.id);
    let currency = state.config().payment.currency;
    let products = listing::visible_products(viewer, rows)
        .into_iter()
        .map(|v: VisibleProduct| ProductCard {
            id: v.product.id.as_i32(),
            title: v.product.title,
            description: v.product.description,
            price_display: v.product.price.display(currency),
            image_url: v.product.image_url,
            in_cart: v.in_cart,
            purchased: v.purchased,
        })
        .collect();

    let is_admin = customer.as_ref().is_some_and(|c| c.role.is_admin());

    Ok(IndexTemplate {
        customer,
        is_admin,
        products,
        message: query.error.as_deref().map(error_message),
    })
}

/// Map an error slug from a redirect back to display text.
fn error_message(slug: &str) -> String {
    match slug {
        "claimed" => "Too late - that piece is already in someone else's cart.".to_owned(),
        _ => "Something went wrong, please try again.".to_owned(),
    }
}
