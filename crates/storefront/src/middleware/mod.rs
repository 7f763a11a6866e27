//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is done per-handler via the extractors in [`auth`]:
//! `RequireCustomer` redirects anonymous callers to the login page,
//! `RequireAdmin` gates catalog management behind the admin role.

pub mod auth;
pub mod session;

pub use auth::{
    OptionalCustomer, RequireAdmin, RequireCustomer, clear_current_customer, set_current_customer,
};
pub use session::{create_session_layer, migrate_session_store};
