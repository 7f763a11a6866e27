//! Reservation ledger repository.
//!
//! Authoritative record of product claims. Every piece is unique stock, so
//! a hold is exclusive: the `reservation_one_unpaid_per_product` partial
//! unique index guarantees at most one unpaid reservation per product, and
//! [`ReservationRepository::reserve`] inserts-if-free inside one
//! transaction rather than checking first and writing later.
//!
//! Holds expire lazily. There are no background tasks; callers pass the
//! cutoff timestamp (now minus the configured TTL) and the queries treat
//! older unpaid rows as released. `reserve` purges them for the product it
//! touches. Paid reservations never expire.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use curio_core::{CustomerId, ProductId};

use super::RepositoryError;
use crate::models::{Product, Reservation};

/// Repository for cart holds and completed purchases.
pub struct ReservationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReservationRepository<'a> {
    /// Create a new reservation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place a hold on a product for a customer.
    ///
    /// Runs a short transaction: purge expired holds on the product, then
    /// insert a new unpaid reservation provided no live claim (paid, or
    /// unpaid and younger than `active_cutoff`) remains. Two customers
    /// racing past the existence check are serialized by the partial unique
    /// index; the loser gets a unique violation, reported as a conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another customer already holds
    /// the product (including losing a concurrent race on the unique index).
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn reserve(
        &self,
        product_id: ProductId,
        customer_id: CustomerId,
        active_cutoff: DateTime<Utc>,
    ) -> Result<Reservation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM reservation
              WHERE product_id = $1 AND NOT paid AND created_at < $2",
        )
        .bind(product_id)
        .bind(active_cutoff)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservation (product_id, customer_id)
             SELECT $1, $2
              WHERE NOT EXISTS (
                    SELECT 1 FROM reservation WHERE product_id = $1
              )
             RETURNING id, product_id, customer_id, paid, created_at",
        )
        .bind(product_id)
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict("product already claimed".to_owned());
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        let Some(reservation) = inserted else {
            return Err(RepositoryError::Conflict(
                "product already claimed".to_owned(),
            ));
        };

        tx.commit().await?;

        Ok(reservation)
    }

    /// Remove the caller's own unpaid hold on a product.
    ///
    /// Only the owner may release a hold; a paid reservation is a completed
    /// purchase and cannot be released.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if this customer holds no unpaid
    /// reservation for the product.
    pub async fn release(
        &self,
        product_id: ProductId,
        customer_id: CustomerId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM reservation
              WHERE product_id = $1 AND customer_id = $2 AND NOT paid",
        )
        .bind(product_id)
        .bind(customer_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// The customer's cart: products with a live unpaid hold, in the order
    /// they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products_reserved_by(
        &self,
        customer_id: CustomerId,
        active_cutoff: DateTime<Utc>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.title, p.description, p.price, p.image_url, p.created_at
             FROM reservation r
             JOIN product p ON p.id = r.product_id
             WHERE r.customer_id = $1 AND NOT r.paid AND r.created_at >= $2
             ORDER BY r.id",
        )
        .bind(customer_id)
        .bind(active_cutoff)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Mark the customer's live unpaid holds as paid.
    ///
    /// Called on checkout completion. Returns how many reservations were
    /// transitioned; zero is not an error (the success page may be reloaded).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_paid(
        &self,
        customer_id: CustomerId,
        active_cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE reservation
                SET paid = TRUE
              WHERE customer_id = $1 AND NOT paid AND created_at >= $2",
        )
        .bind(customer_id)
        .bind(active_cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
