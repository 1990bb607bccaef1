//! QR code queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use snaplist_core::{QrCodeId, ShortCode, UserId};

use super::{PgStore, QrCodeStore, RepositoryError, conflict_on_unique};
use crate::models::{NewQrCode, QrCode};

const QR_CODE_COLUMNS: &str =
    "id, user_id, short_code, name, destination_url, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct QrCodeRow {
    id: i32,
    user_id: i32,
    short_code: String,
    name: String,
    destination_url: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QrCodeRow> for QrCode {
    type Error = RepositoryError;

    fn try_from(row: QrCodeRow) -> Result<Self, Self::Error> {
        let short_code = ShortCode::parse(&row.short_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid short code in database: {e}"))
        })?;

        Ok(Self {
            id: QrCodeId::new(row.id),
            user_id: UserId::new(row.user_id),
            short_code,
            name: row.name,
            destination_url: row.destination_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl QrCodeStore for PgStore {
    #[instrument(skip(self), fields(short_code = %code))]
    async fn find_active_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<QrCode>, RepositoryError> {
        let row: Option<QrCodeRow> = sqlx::query_as(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM qr_codes WHERE short_code = $1 AND is_active"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(QrCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn get_qr_code(
        &self,
        id: QrCodeId,
        user_id: UserId,
    ) -> Result<Option<QrCode>, RepositoryError> {
        let row: Option<QrCodeRow> = sqlx::query_as(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM qr_codes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(QrCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_qr_codes(&self, user_id: UserId) -> Result<Vec<QrCode>, RepositoryError> {
        let rows: Vec<QrCodeRow> = sqlx::query_as(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM qr_codes WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(QrCode::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count_qr_codes(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM qr_codes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;

        Ok(count)
    }

    #[instrument(skip(self, qr_code), fields(user_id = %qr_code.user_id, short_code = %qr_code.short_code))]
    async fn insert_qr_code(&self, qr_code: &NewQrCode) -> Result<QrCode, RepositoryError> {
        let row: QrCodeRow = sqlx::query_as(&format!(
            r"
            INSERT INTO qr_codes (user_id, short_code, name, destination_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {QR_CODE_COLUMNS}
            "
        ))
        .bind(qr_code.user_id)
        .bind(qr_code.short_code.as_str())
        .bind(&qr_code.name)
        .bind(&qr_code.destination_url)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "short code"))?;

        row.try_into()
    }

    #[instrument(skip(self))]
    async fn delete_qr_code(
        &self,
        id: QrCodeId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
