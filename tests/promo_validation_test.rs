//! Promo validation endpoint against the mocked table source.

mod common;

use common::{promo_values_json, response_json, TestApp};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn known_code_is_valid_with_discount() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/promos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(promo_values_json()))
        .mount(&app.server)
        .await;

    let response = app
        .post_json("/promo/validate", json!({ "code": "SAVE10" }))
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body, json!({ "valid": true, "discount": "10" }));
}

#[tokio::test]
async fn unknown_code_is_invalid_without_discount() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/promos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(promo_values_json()))
        .mount(&app.server)
        .await;

    let response = app
        .post_json("/promo/validate", json!({ "code": "NOPE" }))
        .await;
    assert_eq!(response.status(), 200);

    let body = response_json(response).await;
    assert_eq!(body, json!({ "valid": false }));
}

#[tokio::test]
async fn table_is_fetched_fresh_on_every_lookup() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/promos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(promo_values_json()))
        .expect(3)
        .mount(&app.server)
        .await;

    for _ in 0..3 {
        let response = app
            .post_json("/promo/validate", json!({ "code": "SAVE10" }))
            .await;
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn unreachable_table_surfaces_as_bad_gateway() {
    let app = TestApp::new().await;

    Mock::given(method("GET"))
        .and(path("/promos"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.server)
        .await;

    let response = app
        .post_json("/promo/validate", json!({ "code": "SAVE10" }))
        .await;
    assert_eq!(response.status(), 502);
}
