//! Public membership tier listing.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::models::MembershipTier;
use crate::state::AppState;

/// `GET /api/membership-tiers`, cheapest first.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<MembershipTier>>> {
    Ok(Json(state.stores().tiers.list_tiers().await?))
}
