//! Product and claim domain types.

use chrono::{DateTime, Utc};

use curio_core::{CustomerId, Price, ProductId};

/// A catalog product. Every piece is unique stock: one claim at a time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Short display title.
    pub title: String,
    /// Longer description shown on the listing.
    pub description: String,
    /// Price in the shop currency.
    pub price: Price,
    /// Image shown on the listing and sent to the payment provider.
    pub image_url: String,
    /// When the product was added to the catalog.
    pub created_at: DateTime<Utc>,
}

/// The active claim on a product, if any.
///
/// Either an unpaid cart hold that has not yet expired, or a completed
/// purchase. Expired holds are filtered out by the catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    /// Who holds the product.
    pub customer_id: CustomerId,
    /// Whether the purchase completed.
    pub paid: bool,
}

/// A product joined to its active claim, as read from the catalog.
#[derive(Debug, Clone)]
pub struct ListedProduct {
    pub product: Product,
    pub claim: Option<Claim>,
}
