//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - The storefront server running (cargo run -p curio-storefront)
//!
//! ```bash
//! SHOP_BASE_URL=http://localhost:3000 \
//!     cargo test -p curio-integration-tests --test live_shop -- --ignored
//! ```

use reqwest::{Client, StatusCode, redirect};

/// Base URL for the storefront (configurable via environment).
fn shop_base_url() -> String {
    std::env::var("SHOP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps its session cookie and follows redirects, like a
/// browser does.
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A client that stops at the first response, for asserting on redirects.
fn no_redirects() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Register a fresh customer and return the logged-in client.
async fn register(client: &Client, name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let email = format!("{name}-{nanos}@test.example");

    let resp = client
        .post(format!("{}/register", shop_base_url()))
        .form(&[
            ("name", name),
            ("email", email.as_str()),
            ("password", "correct horse battery"),
        ])
        .send()
        .await
        .expect("registration request");
    assert_eq!(resp.status(), StatusCode::OK, "registration should land on the listing");

    email
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn health_endpoints_respond() {
    let base_url = shop_base_url();
    let client = browser();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("health request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("health body"), "ok");

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("readiness request");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn anonymous_cart_is_redirected_to_login() {
    let resp = no_redirects()
        .get(format!("{}/cart", shop_base_url()))
        .send()
        .await
        .expect("cart request");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .expect("Location header")
        .to_str()
        .expect("ASCII location");
    assert_eq!(location, "/login");
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn registration_logs_the_customer_in() {
    let client = browser();
    register(&client, "smoke").await;

    // The session cookie from registration opens the cart
    let resp = client
        .get(format!("{}/cart", shop_base_url()))
        .send()
        .await
        .expect("cart request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("cart body");
    assert!(body.contains("Your cart"));
}

#[tokio::test]
#[ignore = "Requires a running storefront server"]
async fn duplicate_registration_lands_on_login() {
    let client = browser();
    let email = register(&client, "dup").await;

    // Same email again: the shop sends the caller to the login page instead
    let resp = no_redirects()
        .post(format!("{}/register", shop_base_url()))
        .form(&[
            ("name", "Second"),
            ("email", email.as_str()),
            ("password", "correct horse battery"),
        ])
        .send()
        .await
        .expect("second registration");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .expect("Location header")
        .to_str()
        .expect("ASCII location");
    assert!(location.starts_with("/login"));
}
