//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::config::ShopConfig;
use crate::services::payments::{PaymentClient, PaymentError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool,
/// configuration, and the payment provider client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    pool: PgPool,
    payments: PaymentClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment client fails to build.
    pub fn new(config: ShopConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let payments = PaymentClient::new(&config.payment)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
            }),
        })
    }

    /// Get a reference to the shop configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// The oldest `created_at` an unpaid hold may have and still count as a
    /// live claim. Ledger and catalog reads evaluate expiry against this
    /// cutoff instead of a background sweeper.
    #[must_use]
    pub fn claim_cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.inner.config.reservation_ttl()
    }
}
