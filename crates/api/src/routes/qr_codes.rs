//! QR code management routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use snaplist_core::QrCodeId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::QrCode;
use crate::services::qr_codes::QrCodeService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrCodeRequest {
    pub name: String,
    pub destination_url: String,
}

/// `GET /api/qr-codes`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<QrCode>>> {
    Ok(Json(QrCodeService::new(state.stores()).list(user.id).await?))
}

/// `POST /api/qr-codes`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateQrCodeRequest>,
) -> Result<(StatusCode, Json<QrCode>)> {
    let qr_code = QrCodeService::new(state.stores())
        .create(user.id, &body.name, &body.destination_url)
        .await?;
    Ok((StatusCode::CREATED, Json(qr_code)))
}

/// `DELETE /api/qr-codes/{id}`. Deleting a missing code still answers 204.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    QrCodeService::new(state.stores())
        .delete(user.id, QrCodeId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
