//! Shared test harness: a wiremock server standing in for the payment
//! processor, the membership platform, and the promo table, with the real
//! clients pointed at it.

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use membersync_api::config::AppConfig;
use membersync_api::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::MockServer;

pub struct TestApp {
    pub server: MockServer,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_webhook_secret(None).await
    }

    pub async fn with_webhook_secret(secret: Option<String>) -> Self {
        let server = MockServer::start().await;
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            log_level: "info".into(),
            log_json: false,
            square_access_token: "test-token".into(),
            square_base_url: server.uri(),
            square_location_id: "L1".into(),
            square_webhook_secret: secret,
            square_webhook_notification_url: Some("https://api.test.example.com/webhook".into()),
            memberstack_secret: "sk_sb_test".into(),
            memberstack_base_url: server.uri(),
            promo_table_url: format!("{}/promos", server.uri()),
            checkout_redirect_url: "https://shop.example.com/thanks".into(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            http_timeout_secs: 5,
        };
        let state = AppState::from_config(config).expect("app state");
        Self {
            server,
            router: app(state),
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_raw(
        &self,
        path: &str,
        body: Vec<u8>,
        extra_headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body)).expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// A member record as the membership API returns it.
pub fn member_json(id: &str, square_id: Option<&str>, orders: Value) -> Value {
    let mut custom_fields = json!({
        "first-name": "Jo",
        "last-name": "Smith",
        "address": "1 Main St",
        "apartment-suite-etc": "Apt 4",
        "city": "Springfield",
        "postal-code": "90210",
        "state": "CA",
        "country": "United States"
    });
    if let Some(square_id) = square_id {
        custom_fields["square_id"] = json!(square_id);
    }
    json!({
        "id": id,
        "auth": { "email": format!("{}@example.com", id) },
        "customFields": custom_fields,
        "json": { "orders": orders }
    })
}

/// Completed-payment webhook event for an order.
pub fn payment_completed_event(order_id: &str) -> Value {
    json!({
        "type": "payment.updated",
        "data": { "object": { "payment": { "status": "COMPLETED", "order_id": order_id } } }
    })
}

/// Processor order with a single Soda line item.
pub fn soda_order_json(order_id: &str, state: &str, customer_id: &str) -> Value {
    json!({
        "order": {
            "id": order_id,
            "state": state,
            "customerId": customer_id,
            "lineItems": [
                { "name": "Soda", "quantity": 2, "totalMoney": { "amount": 500 } }
            ]
        }
    })
}

/// Promo table rows: header plus one SAVE10 row.
pub fn promo_values_json() -> Value {
    json!({
        "values": [
            ["code", "discount", "valid_from", "valid_to"],
            ["SAVE10", "10%", "2024-01-01", "2030-01-01"]
        ]
    })
}
