//! Catalog management handlers, gated behind the admin role.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use curio_core::{Price, ProductId};

use crate::db::RepositoryError;
use crate::db::catalog::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// New product form data.
#[derive(Debug, Deserialize)]
pub struct NewProductForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
}

/// New product page template.
#[derive(Template, WebTemplate)]
#[template(path = "new_product.html")]
pub struct NewProductTemplate {
    pub customer: Option<CurrentCustomer>,
    pub error: Option<String>,
}

/// Display the new product form.
pub async fn new_product_page(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
    NewProductTemplate {
        customer: Some(admin),
        error: None,
    }
}

/// Handle new product form submission.
///
/// Validation failures re-render the form with a message rather than
/// redirecting, so the admin keeps their input.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<NewProductForm>,
) -> Result<Response> {
    let (title, description, price, image_url) = match validate(&form) {
        Ok(fields) => fields,
        Err(message) => {
            return Ok(NewProductTemplate {
                customer: Some(admin),
                error: Some(message),
            }
            .into_response());
        }
    };

    let product = ProductRepository::new(state.pool())
        .create(title, description, price, image_url.as_str())
        .await?;

    tracing::info!(product_id = %product.id, "Product added to catalog");

    Ok(Redirect::to("/").into_response())
}

/// Delete a product; any reservations on it are deleted with it.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    ProductRepository::new(state.pool())
        .delete(product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {product_id}")),
            other => other.into(),
        })?;

    tracing::info!(product_id = %product_id, "Product deleted from catalog");

    Ok(Redirect::to("/").into_response())
}

/// Check the form fields, returning a display message on failure.
fn validate(form: &NewProductForm) -> std::result::Result<(&str, &str, Price, Url), String> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err("Please enter a title.".to_owned());
    }

    let description = form.description.trim();
    if description.is_empty() {
        return Err("Please enter a description.".to_owned());
    }

    let price = Decimal::from_str(form.price.trim())
        .map_err(|_| "Price must be a number.".to_owned())
        .and_then(|amount| {
            Price::new(amount).map_err(|_| "Price cannot be negative.".to_owned())
        })?;

    let image_url =
        Url::parse(form.image_url.trim()).map_err(|_| "Image URL must be a valid URL.".to_owned())?;

    Ok((title, description, price, image_url))
}
