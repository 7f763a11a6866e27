//! Payment client tests against an in-process mock provider.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use secrecy::SecretString;

use curio_core::CurrencyCode;
use curio_storefront::config::PaymentConfig;
use curio_storefront::services::payments::{LineItem, PaymentClient, PaymentError};

/// Captured request body, shared with the mock handler.
type Captured = Arc<Mutex<Option<String>>>;

/// Start a mock provider that answers `POST /v1/checkout/sessions` with a
/// fixed response and records the form body it received.
async fn spawn_mock(status: StatusCode, response_body: &'static str, captured: Captured) -> String {
    let app = Router::new().route(
        "/v1/checkout/sessions",
        post(move |body: String| {
            let captured = Arc::clone(&captured);
            async move {
                *captured.lock().expect("mock lock") = Some(body);
                (
                    status,
                    [("content-type", "application/json")],
                    response_body,
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr: SocketAddr = listener.local_addr().expect("mock address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    format!("http://{addr}")
}

fn client(api_url: &str) -> PaymentClient {
    PaymentClient::new(&PaymentConfig {
        secret_key: SecretString::from("sk_test_0123456789"),
        api_url: api_url.to_owned(),
        currency: CurrencyCode::Gbp,
    })
    .expect("payment client")
}

fn decode_form(body: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

fn field<'a>(fields: &'a [(String, String)], key: &str) -> &'a str {
    &fields
        .iter()
        .find(|(k, _)| k == key)
        .unwrap_or_else(|| panic!("missing field {key}"))
        .1
}

#[tokio::test]
async fn checkout_session_submits_line_items_and_returns_id() {
    let captured: Captured = Arc::default();
    let api_url = spawn_mock(
        StatusCode::OK,
        r#"{"id": "cs_test_123", "object": "checkout.session"}"#,
        Arc::clone(&captured),
    )
    .await;

    let line_items = [
        LineItem {
            name: "Vase".to_owned(),
            image_url: "https://img.example/vase.jpg".to_owned(),
            unit_amount: 500,
        },
        LineItem {
            name: "Bowl".to_owned(),
            image_url: "https://img.example/bowl.jpg".to_owned(),
            unit_amount: 350,
        },
    ];

    let session = client(&api_url)
        .create_checkout_session(
            &line_items,
            "http://localhost:3000/success",
            "http://localhost:3000/cart",
        )
        .await
        .expect("session created");

    assert_eq!(session.id, "cs_test_123");

    let body = captured.lock().expect("mock lock").clone().expect("request captured");
    let fields = decode_form(&body);

    assert_eq!(field(&fields, "mode"), "payment");
    assert_eq!(field(&fields, "success_url"), "http://localhost:3000/success");
    assert_eq!(field(&fields, "cancel_url"), "http://localhost:3000/cart");
    assert_eq!(
        field(&fields, "line_items[0][price_data][product_data][name]"),
        "Vase"
    );
    assert_eq!(field(&fields, "line_items[1][price_data][currency]"), "gbp");

    // Two line items totalling 850 minor units
    let total: i64 = fields
        .iter()
        .filter(|(k, _)| k.ends_with("[unit_amount]"))
        .map(|(_, v)| v.parse::<i64>().expect("numeric amount"))
        .sum();
    assert_eq!(total, 850);
}

#[tokio::test]
async fn provider_rejection_carries_the_message() {
    let captured: Captured = Arc::default();
    let api_url = spawn_mock(
        StatusCode::PAYMENT_REQUIRED,
        r#"{"error": {"message": "Your card was declined"}}"#,
        Arc::clone(&captured),
    )
    .await;

    let line_items = [LineItem {
        name: "Vase".to_owned(),
        image_url: "https://img.example/vase.jpg".to_owned(),
        unit_amount: 999,
    }];

    let error = client(&api_url)
        .create_checkout_session(
            &line_items,
            "http://localhost:3000/success",
            "http://localhost:3000/cart",
        )
        .await
        .expect_err("provider rejected");

    match error {
        PaymentError::Api { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "Your card was declined");
        }
        other => panic!("unexpected error: {other}"),
    }
}
