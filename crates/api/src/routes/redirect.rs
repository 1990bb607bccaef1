//! Redirect metadata for the client-side redirect page.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::redirect::{self, RedirectInfo};
use crate::state::AppState;

/// `GET /api/redirect-info/{shortCode}`
///
/// Unknown, malformed and inactive codes give `404 {"error": "QR code not found"}`,
/// which the client treats as "send the visitor home".
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Json<RedirectInfo>> {
    redirect::resolve(state.stores().qr_codes.as_ref(), &short_code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("QR code not found".to_owned()))
}
