//! Cart route handlers.
//!
//! All routes require a logged-in user and only ever see that user's items.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use snaplist_core::{CartItemId, QrCodeId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartItemWithQrCode, Order};
use crate::services::cart::{AddToCart, CartService};
use crate::services::orders::OrderService;
use crate::state::AppState;

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub qr_code_id: i32,
    pub product_type: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

/// `GET /api/cart`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartItemWithQrCode>>> {
    let items = CartService::new(state.stores())
        .get_user_cart_items(user.id)
        .await?;
    Ok(Json(items))
}

/// `POST /api/cart`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let item = CartService::new(state.stores())
        .add_to_cart(
            user.id,
            AddToCart {
                qr_code_id: QrCodeId::new(body.qr_code_id),
                product_type: &body.product_type,
                size: body.size.as_deref(),
                quantity: body.quantity,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /api/cart/count`
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartCount>> {
    let count = CartService::new(state.stores())
        .get_cart_item_count(user.id)
        .await?;
    Ok(Json(CartCount { count }))
}

/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<StatusCode> {
    CartService::new(state.stores()).clear_cart(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /api/cart/{id}`
///
/// Returns the updated item, or 204 when the item was removed (quantity
/// <= 0) or does not belong to the user.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Response> {
    let updated = CartService::new(state.stores())
        .update_cart_item_quantity(CartItemId::new(id), user.id, body.quantity)
        .await?;

    Ok(match updated {
        Some(item) => Json(item).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// `DELETE /api/cart/{id}`
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    CartService::new(state.stores())
        .remove_from_cart(CartItemId::new(id), user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/cart/checkout`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.stores(), state.email())
        .checkout(user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}
