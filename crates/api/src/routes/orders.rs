//! Order history.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::OrderWithItems;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// `GET /api/orders`, newest first, each with its `items`.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = OrderService::new(state.stores(), state.email())
        .list(user.id)
        .await?;
    Ok(Json(orders))
}
