//! Integration tests for SnapList.
//!
//! The tests drive the full router (sessions, request IDs, error mapping)
//! in-process against the in-memory stores from `snaplist_api::testkit`,
//! so no database or SMTP server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p snaplist-integration-tests
//! ```

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use snaplist_api::routes;
use snaplist_api::testkit::TestContext;

/// A router wired to in-memory stores, plus a cookie jar of one.
pub struct TestApp {
    pub ctx: TestContext,
    router: Router,
    cookie: Option<String>,
}

/// Status and decoded JSON body (`Value::Null` when the body is empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_context(TestContext::new())
    }

    #[must_use]
    pub fn with_context(ctx: TestContext) -> Self {
        let router = routes::app(ctx.state.clone(), tower_sessions::MemoryStore::default());
        Self {
            ctx,
            router,
            cookie: None,
        }
    }

    /// Send a request, keeping any session cookie the server hands back.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .expect("ascii cookie")
                .split(';')
                .next()
                .unwrap_or_default()
                .to_owned();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Register and stay logged in.
    ///
    /// # Panics
    ///
    /// Panics if registration is rejected.
    pub async fn register(&mut self, email: &str, name: &str) -> Value {
        let response = self
            .post(
                "/api/auth/register",
                serde_json::json!({
                    "email": email,
                    "password": "correct horse battery",
                    "name": name,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }

    /// Forget the session cookie.
    pub fn log_out_locally(&mut self) {
        self.cookie = None;
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
