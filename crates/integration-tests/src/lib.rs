//! Integration tests for Curio.
//!
//! # Running Tests
//!
//! ```bash
//! # Router and payment-client tests run without external services
//! cargo test -p curio-integration-tests
//!
//! # Ledger tests need a PostgreSQL database
//! DATABASE_URL=postgres://localhost/curio_test \
//!     cargo test -p curio-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_routes` - In-process router tests (lazy pool, no database)
//! - `payments_client` - Payment client against a local mock provider
//! - `reservation_ledger` - Ledger semantics against a real database
//! - `live_shop` - End-to-end smoke tests against a running server
//!   (`SHOP_BASE_URL`)

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use curio_core::CurrencyCode;
use curio_storefront::config::{PaymentConfig, ShopConfig};
use curio_storefront::middleware::create_session_layer;
use curio_storefront::routes;
use curio_storefront::state::AppState;

/// A shop configuration for tests; nothing in it is ever dialed out to
/// except the payment API URL, which tests point at a local mock.
#[must_use]
pub fn test_config(payment_api_url: &str) -> ShopConfig {
    ShopConfig {
        database_url: SecretString::from("postgres://localhost/curio_test"),
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("test-session-secret-0123456789abcdef"),
        payment: PaymentConfig {
            secret_key: SecretString::from("sk_test_0123456789"),
            api_url: payment_api_url.to_owned(),
            currency: CurrencyCode::Gbp,
        },
        reservation_ttl_hours: 24,
        admin_email: None,
        sentry_dsn: None,
    }
}

/// A pool that never connects until a query runs. Requests that stay out
/// of the database (auth redirects, admin gate rejections, health) succeed
/// against it without a server.
#[must_use]
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/curio_test")
        .expect("valid database URL")
}

/// Build the full application router on a lazy pool.
#[must_use]
pub fn test_app(payment_api_url: &str) -> axum::Router {
    let config = test_config(payment_api_url);
    let state = AppState::new(config, lazy_pool()).expect("Failed to build test state");
    let session_layer = create_session_layer(state.pool(), state.config());
    routes::router(state, session_layer)
}
