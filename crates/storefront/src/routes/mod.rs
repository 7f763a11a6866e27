//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Product listing (per-viewer visibility)
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database)
//!
//! # Accounts
//! GET  /register                - Registration page
//! POST /register                - Register and log in
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! GET  /logout                  - Logout action
//!
//! # Cart
//! GET  /cart                    - Cart page (requires login)
//! GET  /add-to-cart?product_id= - Place a hold on a product
//! GET  /delete-from-cart?product_id= - Release the caller's own hold
//!
//! # Checkout
//! POST /create-checkout-session - Create a hosted checkout session (JSON)
//! GET  /success                 - Checkout completion; marks holds paid
//!
//! # Catalog management (admin role only)
//! GET  /new-product             - New product form
//! POST /new-product             - Create product
//! GET  /delete/{product_id}     - Delete product
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Storefront
        .route("/", get(home::index))
        // Accounts
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        // Cart
        .route("/cart", get(cart::show))
        .route("/add-to-cart", get(cart::add))
        .route("/delete-from-cart", get(cart::remove))
        // Checkout
        .route("/create-checkout-session", post(cart::create_checkout_session))
        .route("/success", get(cart::success))
        // Catalog management
        .route(
            "/new-product",
            get(admin::new_product_page).post(admin::create_product),
        )
        .route("/delete/{product_id}", get(admin::delete_product))
}

/// Assemble the full router: health endpoints, application routes, session
/// and tracing layers. The binary adds the Sentry layers on top.
pub fn router(state: AppState, session_layer: SessionManagerLayer<PostgresStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
