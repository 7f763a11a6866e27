//! Customer domain types.

use chrono::{DateTime, Utc};

use curio_core::{CustomerId, Email, Role};

/// A registered customer.
///
/// The password hash is deliberately not part of this type; it is only
/// surfaced by the repository call that verifies credentials.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// What this account may do.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
