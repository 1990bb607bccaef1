//! Integration tests for the signed-in flows: account, QR codes, cart
//! and checkout.
//!
//! Run with: cargo test -p snaplist-integration-tests

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use snaplist_integration_tests::TestApp;

async fn create_qr_code(app: &mut TestApp, name: &str) -> Value {
    let response = app
        .post(
            "/api/qr-codes",
            json!({ "name": name, "destinationUrl": "https://example.com/menu" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_session() {
    let mut app = TestApp::new();

    for uri in ["/api/cart", "/api/cart/count", "/api/qr-codes", "/api/orders", "/api/auth/me"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body, json!({ "error": "Not authenticated" }));
    }
}

#[tokio::test]
async fn test_register_login_logout() {
    let mut app = TestApp::new();

    let profile = app.register("ana@example.com", "Ana").await;
    assert_eq!(profile["email"], "ana@example.com");
    assert_eq!(profile["membershipTier"], "FREE");

    let me = app.get("/api/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["name"], "Ana");

    let welcome = app.ctx.mail.sent();
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0].to, "ana@example.com");

    let logout = app.request(Method::POST, "/api/auth/logout", None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/auth/me").await.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post(
            "/api/auth/login",
            json!({ "email": "ana@example.com", "password": "correct horse battery" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(app.get("/api/auth/me").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    app.log_out_locally();

    let response = app
        .post(
            "/api/auth/register",
            json!({
                "email": "ana@example.com",
                "password": "another password",
                "name": "Ana Again",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    app.log_out_locally();

    let response = app
        .post(
            "/api/auth/login",
            json!({ "email": "ana@example.com", "password": "wrong password" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "error": "Invalid credentials" }));
}

// ============================================================================
// QR codes
// ============================================================================

#[tokio::test]
async fn test_created_code_resolves_publicly() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;

    let qr = create_qr_code(&mut app, "Menu").await;
    let short_code = qr["shortCode"].as_str().expect("short code").to_owned();
    app.log_out_locally();

    let info = app.get(&format!("/api/redirect-info/{short_code}")).await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.body["destinationUrl"], "https://example.com/menu");
}

#[tokio::test]
async fn test_free_quota_is_forbidden_past_limit() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;

    for i in 0..5 {
        create_qr_code(&mut app, &format!("Code {i}")).await;
    }
    let response = app
        .post(
            "/api/qr-codes",
            json!({ "name": "Sixth", "destinationUrl": "https://example.com" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/api/qr-codes").await.body.as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_delete_qr_code() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;

    let response = app
        .request(Method::DELETE, &format!("/api/qr-codes/{}", qr["id"]), None)
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/qr-codes").await.body, json!([]));
}

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
async fn test_cart_to_order() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;

    for quantity in [2, 3] {
        let added = app
            .post(
                "/api/cart",
                json!({
                    "qrCodeId": qr["id"],
                    "productType": "t-shirt",
                    "size": "M",
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(added.status, StatusCode::CREATED, "{:?}", added.body);
    }

    let items = app.get("/api/cart").await;
    assert_eq!(items.body.as_array().map(Vec::len), Some(1));
    assert_eq!(items.body[0]["quantity"], 5);
    assert_eq!(items.body[0]["qrCode"]["name"], "Menu");
    assert_eq!(app.get("/api/cart/count").await.body, json!({ "count": 5 }));

    let order = app.request(Method::POST, "/api/cart/checkout", None).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["status"], "pending");
    assert_eq!(order.body["itemCount"], 5);
    assert!(
        order.body["orderNumber"]
            .as_str()
            .is_some_and(|n| n.starts_with("SL-"))
    );

    assert_eq!(app.get("/api/cart/count").await.body, json!({ "count": 0 }));
    let orders = app.get("/api/orders").await;
    assert_eq!(orders.body.as_array().map(Vec::len), Some(1));
    assert_eq!(orders.body[0]["orderNumber"], order.body["orderNumber"]);
    assert_eq!(orders.body[0]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(orders.body[0]["items"][0]["quantity"], 5);
    assert_eq!(orders.body[0]["items"][0]["size"], "M");
}

#[tokio::test]
async fn test_checkout_empty_cart_is_bad_request() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;

    let response = app.request(Method::POST, "/api/cart/checkout", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_patch_to_zero_removes_item() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;
    let added = app
        .post(
            "/api/cart",
            json!({ "qrCodeId": qr["id"], "productType": "sticker", "quantity": 1 }),
        )
        .await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/cart/{}", added.body["id"]),
            Some(json!({ "quantity": 0 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/cart").await.body, json!([]));
}

#[tokio::test]
async fn test_patch_negative_quantity_removes_item() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;
    let added = app
        .post(
            "/api/cart",
            json!({ "qrCodeId": qr["id"], "productType": "sticker", "quantity": 3 }),
        )
        .await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/cart/{}", added.body["id"]),
            Some(json!({ "quantity": -1 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/api/cart/count").await.body, json!({ "count": 0 }));
}

#[tokio::test]
async fn test_oversized_quantities_are_bad_requests() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;

    let huge = app
        .post(
            "/api/cart",
            json!({ "qrCodeId": qr["id"], "productType": "sticker", "quantity": i32::MAX }),
        )
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);

    let line = json!({ "qrCodeId": qr["id"], "productType": "sticker", "quantity": 999 });
    let full = app.post("/api/cart", line.clone()).await;
    assert_eq!(full.status, StatusCode::CREATED);
    let merged = app.post("/api/cart", line).await;
    assert_eq!(merged.status, StatusCode::BAD_REQUEST);
    assert!(merged.body["error"].is_string());

    let patched = app
        .request(
            Method::PATCH,
            &format!("/api/cart/{}", full.body["id"]),
            Some(json!({ "quantity": 1000 })),
        )
        .await;
    assert_eq!(patched.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/api/cart/count").await.body, json!({ "count": 999 }));

    let order = app.request(Method::POST, "/api/cart/checkout", None).await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["itemCount"], 999);
}

#[tokio::test]
async fn test_cannot_add_another_users_code() {
    let mut app = TestApp::new();
    app.register("ana@example.com", "Ana").await;
    let qr = create_qr_code(&mut app, "Menu").await;

    app.log_out_locally();
    app.register("ben@example.com", "Ben").await;

    let response = app
        .post(
            "/api/cart",
            json!({ "qrCodeId": qr["id"], "productType": "sticker", "quantity": 1 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
