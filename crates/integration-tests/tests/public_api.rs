//! Integration tests for the unauthenticated endpoints.
//!
//! Run with: cargo test -p snaplist-integration-tests

use axum::http::StatusCode;
use serde_json::json;

use snaplist_api::services::membership::{default_tier_definitions, seed_membership_tiers};
use snaplist_api::testkit::test_config;
use snaplist_core::TierName;
use snaplist_integration_tests::TestApp;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let mut app = TestApp::new();

    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, json!("ok"));

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_unavailable_store() {
    let mut app = TestApp::new();
    app.ctx.store.set_unavailable(true);

    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(app.get("/health").await.status, StatusCode::OK);
}

// ============================================================================
// Redirect info
// ============================================================================

#[tokio::test]
async fn test_redirect_info_for_active_code() {
    let mut app = TestApp::new();
    let user = app
        .ctx
        .store
        .seed_user("ana@example.com", "Ana", TierName::Free);
    app.ctx
        .store
        .seed_qr_code(user.id, "aZ3kP9qL", "Lunch menu", "https://example.com/menu");

    let response = app.get("/api/redirect-info/aZ3kP9qL").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "name": "Lunch menu",
            "destinationUrl": "https://example.com/menu",
            "shortCode": "aZ3kP9qL",
            "redirectDelaySeconds": 5,
        })
    );
}

#[tokio::test]
async fn test_redirect_info_unknown_code_is_json_404() {
    let mut app = TestApp::new();

    let response = app.get("/api/redirect-info/nope1234").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_redirect_info_inactive_code_is_404() {
    let mut app = TestApp::new();
    let user = app
        .ctx
        .store
        .seed_user("ana@example.com", "Ana", TierName::Free);
    let qr = app
        .ctx
        .store
        .seed_qr_code(user.id, "aZ3kP9qL", "Menu", "https://example.com/menu");
    app.ctx.store.set_qr_code_active(qr.id, false);

    assert_eq!(
        app.get("/api/redirect-info/aZ3kP9qL").await.status,
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Membership tiers
// ============================================================================

#[tokio::test]
async fn test_membership_tiers_cheapest_first() {
    let mut app = TestApp::new();
    let report = seed_membership_tiers(
        app.ctx.stores().tiers.as_ref(),
        &default_tier_definitions(&test_config().billing),
    )
    .await;
    assert!(report.is_success());

    let response = app.get("/api/membership-tiers").await;

    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response
        .body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|tier| tier["name"].as_str())
        .collect();
    assert_eq!(names, ["FREE", "STANDARD", "PRO"]);
    assert_eq!(response.body[0]["maxQrCodes"], 5);
    assert!(response.body[2]["maxQrCodes"].is_null());
}

#[tokio::test]
async fn test_membership_tiers_empty_before_seeding() {
    let mut app = TestApp::new();

    let response = app.get("/api/membership-tiers").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

// ============================================================================
// Newsletter
// ============================================================================

#[tokio::test]
async fn test_newsletter_subscribe_and_repeat() {
    let mut app = TestApp::new();

    let first = app
        .post(
            "/api/newsletter/subscribe",
            json!({ "email": "fan@example.com", "name": "Fan" }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(
        first.body,
        json!({ "subscribed": true, "alreadySubscribed": false })
    );

    let second = app
        .post(
            "/api/newsletter/subscribe",
            json!({ "email": "fan@example.com" }),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["alreadySubscribed"], true);

    assert_eq!(app.ctx.store.subscriber_count(), 1);
    assert!(
        app.ctx
            .mail
            .sent()
            .iter()
            .all(|email| email.to == "fan@example.com")
    );
}

#[tokio::test]
async fn test_newsletter_rejects_invalid_email() {
    let mut app = TestApp::new();

    let response = app
        .post(
            "/api/newsletter/subscribe",
            json!({ "email": "not-an-email" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "Invalid email address" }));
    assert_eq!(app.ctx.store.subscriber_count(), 0);
}
