//! Reservation domain type.

use chrono::{DateTime, Utc};

use curio_core::{CustomerId, ProductId, ReservationId};

/// A claim linking one customer to one product.
///
/// Unpaid reservations are cart holds; paid reservations are completed
/// purchases. An unpaid hold older than the configured TTL no longer
/// counts as a claim.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reservation {
    /// Unique reservation ID.
    pub id: ReservationId,
    /// The claimed product.
    pub product_id: ProductId,
    /// The customer holding the claim.
    pub customer_id: CustomerId,
    /// Whether the purchase completed.
    pub paid: bool,
    /// When the claim was placed; drives hold expiry.
    pub created_at: DateTime<Utc>,
}
