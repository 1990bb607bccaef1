//! Newsletter subscription route.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::services::newsletter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub subscribed: bool,
    pub already_subscribed: bool,
}

/// `POST /api/newsletter/subscribe`
///
/// Repeat sign-ups succeed; the response says whether the address was new.
#[instrument(skip(state, body))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    let outcome = newsletter::subscribe(
        state.stores(),
        state.email(),
        &body.email,
        body.name.as_deref(),
    )
    .await?;

    Ok(Json(SubscribeResponse {
        subscribed: true,
        already_subscribed: !outcome.newly_subscribed,
    }))
}
