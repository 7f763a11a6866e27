//! Product catalog repository.
//!
//! The listing query joins each product to its *active* claim: a paid
//! purchase, or an unpaid hold younger than the reservation TTL. Expired
//! holds are ignored here and purged by the ledger on the next reserve.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use curio_core::{CustomerId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Claim, ListedProduct, Product};

const PRODUCT_COLUMNS: &str = "id, title, description, price, image_url, created_at";

/// Repository for product catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product into the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        price: Price,
        image_url: &str,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO product (title, description, price, image_url)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, description, price, image_url, created_at",
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Delete a product; any reservations on it go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List every product with its active claim, in catalog insertion order.
    ///
    /// `active_cutoff` is the oldest `created_at` an unpaid hold may have and
    /// still count as active. The single-claim invariant guarantees at most
    /// one joined row per product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_claims(
        &self,
        active_cutoff: DateTime<Utc>,
    ) -> Result<Vec<ListedProduct>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.description, p.price, p.image_url, p.created_at,
                    r.customer_id AS claim_customer_id, r.paid AS claim_paid
             FROM product p
             LEFT JOIN reservation r
                    ON r.product_id = p.id AND (r.paid OR r.created_at >= $1)
             ORDER BY p.id",
        )
        .bind(active_cutoff)
        .fetch_all(self.pool)
        .await?;

        let mut listed = Vec::with_capacity(rows.len());
        for row in rows {
            let product = Product {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                description: row.try_get("description")?,
                price: row.try_get("price")?,
                image_url: row.try_get("image_url")?,
                created_at: row.try_get("created_at")?,
            };

            let claim = row
                .try_get::<Option<CustomerId>, _>("claim_customer_id")?
                .map(|customer_id| -> Result<Claim, sqlx::Error> {
                    Ok(Claim {
                        customer_id,
                        paid: row.try_get::<Option<bool>, _>("claim_paid")?.unwrap_or(false),
                    })
                })
                .transpose()?;

            listed.push(ListedProduct { product, claim });
        }

        Ok(listed)
    }
}
