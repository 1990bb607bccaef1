//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Readiness (store ping)
//!
//! # Public
//! GET    /api/redirect-info/{shortCode}  - Redirect metadata or 404
//! GET    /api/membership-tiers           - All tiers, cheapest first
//! POST   /api/newsletter/subscribe       - Newsletter sign-up
//!
//! # Auth
//! POST   /api/auth/register              - Create account and log in
//! POST   /api/auth/login                 - Log in
//! POST   /api/auth/logout                - Log out
//! GET    /api/auth/me                    - Profile and tier (requires auth)
//!
//! # Cart (requires auth)
//! GET    /api/cart                       - List items
//! POST   /api/cart                       - Add item (merges duplicates)
//! DELETE /api/cart                       - Clear
//! GET    /api/cart/count                 - Total quantity
//! POST   /api/cart/checkout              - Place order from cart
//! PATCH  /api/cart/{id}                  - Set quantity (<= 0 removes)
//! DELETE /api/cart/{id}                  - Remove item
//!
//! # QR codes and orders (requires auth)
//! GET    /api/qr-codes                   - List
//! POST   /api/qr-codes                   - Create (tier quota enforced)
//! DELETE /api/qr-codes/{id}              - Delete
//! GET    /api/orders                     - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod newsletter;
pub mod orders;
pub mod qr_codes;
pub mod redirect;
pub mod tiers;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::index).post(cart::add).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/checkout", post(cart::checkout))
        .route("/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the QR code routes router.
pub fn qr_code_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(qr_codes::index).post(qr_codes::create))
        .route("/{id}", delete(qr_codes::delete))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/redirect-info/{short_code}", get(redirect::show))
        .route("/membership-tiers", get(tiers::index))
        .route("/newsletter/subscribe", post(newsletter::subscribe))
        .route("/orders", get(orders::index))
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/qr-codes", qr_code_routes())
}

/// Build the complete application with its middleware stack.
///
/// `session_store` is a `PostgresStore` in production and
/// `tower_sessions::MemoryStore` in tests.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .layer(session_layer)
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.stores().health.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
