//! Reservation ledger semantics against a real `PostgreSQL` database.
//!
//! These tests require a database:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/curio_test \
//!     cargo test -p curio-integration-tests -- --ignored
//! ```
//!
//! Each test creates its own customers and products and leaves paid/held
//! state behind; run against a throwaway database.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use curio_core::{CustomerId, Email, Price, ProductId, Role};
use curio_storefront::db::catalog::ProductRepository;
use curio_storefront::db::customers::CustomerRepository;
use curio_storefront::db::reservations::ReservationRepository;
use curio_storefront::db::{MIGRATOR, RepositoryError};
use curio_storefront::services::listing::{cart_total, visible_products};

async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ledger tests");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("database reachable");
    MIGRATOR.run(&pool).await.expect("migrations apply");
    pool
}

/// Active-claim cutoff for a 24h hold TTL.
fn cutoff() -> DateTime<Utc> {
    Utc::now() - Duration::hours(24)
}

/// Register a throwaway customer; emails are unique per call.
async fn new_customer(pool: &PgPool, tag: &str) -> CustomerId {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let email = Email::parse(&format!("{tag}-{nanos}@test.example")).expect("valid email");

    CustomerRepository::new(pool)
        .create(&email, tag, "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA", Role::Customer)
        .await
        .expect("customer created")
        .id
}

async fn new_product(pool: &PgPool, title: &str, pence: i64) -> ProductId {
    ProductRepository::new(pool)
        .create(
            title,
            "A one-of-a-kind piece",
            Price::new(Decimal::new(pence, 2)).expect("non-negative price"),
            "https://img.example/piece.jpg",
        )
        .await
        .expect("product created")
        .id
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn reserve_is_exclusive_until_released() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;
    let bob = new_customer(&pool, "bob").await;
    let piece = new_product(&pool, "Vase", 999).await;

    ledger.reserve(piece, alice, cutoff()).await.expect("first hold");

    // Second hold on the same piece loses, whoever asks
    let err = ledger.reserve(piece, bob, cutoff()).await.expect_err("piece is held");
    assert!(matches!(err, RepositoryError::Conflict(_)));
    let err = ledger.reserve(piece, alice, cutoff()).await.expect_err("still held");
    assert!(matches!(err, RepositoryError::Conflict(_)));

    // Released by its owner, the piece is reservable again
    ledger.release(piece, alice).await.expect("owner releases");
    ledger.reserve(piece, bob, cutoff()).await.expect("now free");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn release_requires_ownership() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;
    let bob = new_customer(&pool, "bob").await;
    let piece = new_product(&pool, "Bowl", 500).await;

    ledger.reserve(piece, alice, cutoff()).await.expect("hold placed");

    let err = ledger.release(piece, bob).await.expect_err("not bob's hold");
    assert!(matches!(err, RepositoryError::NotFound));

    // Alice's hold survived the attempt
    let cart = ledger.products_reserved_by(alice, cutoff()).await.expect("cart read");
    assert_eq!(cart.len(), 1);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn reserving_a_missing_product_is_not_found() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;

    let err = ledger
        .reserve(ProductId::new(i32::MAX), alice, cutoff())
        .await
        .expect_err("no such product");
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn cart_and_visibility_follow_the_ledger() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);
    let catalog = ProductRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;
    let bob = new_customer(&pool, "bob").await;
    let p1 = new_product(&pool, "Vase", 999).await;

    ledger.reserve(p1, alice, cutoff()).await.expect("hold placed");

    // Alice's cart totals 9.99
    let cart = ledger.products_reserved_by(alice, cutoff()).await.expect("cart read");
    assert_eq!(cart.iter().map(|p| p.id).collect::<Vec<_>>(), vec![p1]);
    assert_eq!(cart_total(&cart).minor_units(), 999);

    // Bob and anonymous viewers no longer see the piece; Alice sees it in-cart
    let rows = catalog.list_with_claims(cutoff()).await.expect("listing read");
    assert!(
        !visible_products(Some(bob), rows.clone())
            .iter()
            .any(|v| v.product.id == p1)
    );
    assert!(
        !visible_products(None, rows.clone())
            .iter()
            .any(|v| v.product.id == p1)
    );
    let alices = visible_products(Some(alice), rows);
    let held = alices.iter().find(|v| v.product.id == p1).expect("visible to holder");
    assert!(held.in_cart);

    // Removing it restores the piece for everyone and empties the cart
    ledger.release(p1, alice).await.expect("owner releases");
    let rows = catalog.list_with_claims(cutoff()).await.expect("listing read");
    assert!(
        visible_products(Some(bob), rows)
            .iter()
            .any(|v| v.product.id == p1 && !v.in_cart)
    );
    let cart = ledger.products_reserved_by(alice, cutoff()).await.expect("cart read");
    assert!(cart.is_empty());
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn checkout_completion_marks_holds_paid() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);
    let catalog = ProductRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;
    let bob = new_customer(&pool, "bob").await;
    let p1 = new_product(&pool, "Vase", 500).await;
    let p2 = new_product(&pool, "Bowl", 350).await;

    ledger.reserve(p1, alice, cutoff()).await.expect("hold placed");
    ledger.reserve(p2, alice, cutoff()).await.expect("hold placed");

    assert_eq!(ledger.mark_paid(alice, cutoff()).await.expect("paid"), 2);
    // Reload finds nothing further to mark
    assert_eq!(ledger.mark_paid(alice, cutoff()).await.expect("paid"), 0);

    // Purchased pieces leave the cart but stay claimed forever
    let cart = ledger.products_reserved_by(alice, cutoff()).await.expect("cart read");
    assert!(cart.is_empty());

    let rows = catalog.list_with_claims(cutoff()).await.expect("listing read");
    assert!(
        !visible_products(Some(bob), rows.clone())
            .iter()
            .any(|v| v.product.id == p1)
    );
    let alices = visible_products(Some(alice), rows);
    let bought = alices.iter().find(|v| v.product.id == p1).expect("visible to buyer");
    assert!(bought.purchased);

    // A paid claim cannot be released or re-reserved
    let err = ledger.release(p1, alice).await.expect_err("purchase is final");
    assert!(matches!(err, RepositoryError::NotFound));
    let err = ledger.reserve(p1, bob, cutoff()).await.expect_err("sold out");
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn expired_holds_release_the_piece() {
    let pool = test_pool().await;
    let ledger = ReservationRepository::new(&pool);
    let catalog = ProductRepository::new(&pool);

    let alice = new_customer(&pool, "alice").await;
    let bob = new_customer(&pool, "bob").await;
    let piece = new_product(&pool, "Lamp", 1200).await;

    let hold = ledger.reserve(piece, alice, cutoff()).await.expect("hold placed");

    // Age the hold past the TTL
    sqlx::query("UPDATE reservation SET created_at = now() - interval '48 hours' WHERE id = $1")
        .bind(hold.id)
        .execute(&pool)
        .await
        .expect("hold aged");

    // The stale hold no longer counts anywhere
    let cart = ledger.products_reserved_by(alice, cutoff()).await.expect("cart read");
    assert!(cart.is_empty());
    let rows = catalog.list_with_claims(cutoff()).await.expect("listing read");
    assert!(
        visible_products(None, rows)
            .iter()
            .any(|v| v.product.id == piece)
    );

    // And the piece is reservable by someone else
    ledger.reserve(piece, bob, cutoff()).await.expect("stale hold purged");
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn duplicate_email_registration_conflicts() {
    let pool = test_pool().await;
    let customers = CustomerRepository::new(&pool);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let email = Email::parse(&format!("dup-{nanos}@test.example")).expect("valid email");

    let first = customers
        .create(&email, "First", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA", Role::Customer)
        .await
        .expect("first registration");

    let err = customers
        .create(&email, "Second", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA", Role::Customer)
        .await
        .expect_err("email taken");
    assert!(matches!(err, RepositoryError::Conflict(_)));

    // The existing account is unaffected
    let kept = customers
        .get_by_id(first.id)
        .await
        .expect("lookup")
        .expect("still there");
    assert_eq!(kept.name, "First");
}
