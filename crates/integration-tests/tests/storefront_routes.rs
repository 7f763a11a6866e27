//! Router-level tests that run without a database.
//!
//! The pool is lazy, so any request that would touch `PostgreSQL` fails;
//! these tests only exercise paths that are decided before a query runs:
//! authentication redirects, the admin gate, and the health endpoint.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use curio_integration_tests::test_app;

fn app() -> Router {
    // No test here reaches the payment provider
    test_app("http://127.0.0.1:9")
}

async fn get(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
    .expect("router is infallible")
}

async fn post(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
    .expect("router is infallible")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ASCII location")
}

#[tokio::test]
async fn health_returns_ok() {
    let response = get(app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn login_and_register_pages_render() {
    let response = get(app(), "/login").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app(), "/register").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_cart_redirects_to_login() {
    let response = get(app(), "/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn anonymous_cart_mutations_redirect_to_login() {
    let response = get(app(), "/add-to-cart?product_id=1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = get(app(), "/delete-from-cart?product_id=1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn anonymous_checkout_redirects_to_login() {
    let response = post(app(), "/create-checkout-session").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = get(app(), "/success").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn admin_routes_forbidden_for_anonymous() {
    // The admin gate rejects before any form parsing, so the payload
    // never matters.
    let response = get(app(), "/new-product").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post(app(), "/new-product").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(app(), "/delete/1").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = get(app(), "/no-such-page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
