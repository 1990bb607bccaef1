//! Cart item queries.
//!
//! The `(user_id, qr_code_id, product_type, size)` unique index makes
//! add-to-cart a single `INSERT .. ON CONFLICT .. DO UPDATE`. Absent sizes are
//! stored as `''` so they take part in the index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use snaplist_core::{CartItemId, QrCodeId, ShortCode, UserId};

use super::{CartStore, PgStore, RepositoryError};
use crate::models::cart::{MAX_QUANTITY_PER_LINE, size_from_column};
use crate::models::{CartItem, CartItemWithQrCode, NewCartItem, QrCodeSummary};

const CART_ITEM_COLUMNS: &str =
    "id, user_id, qr_code_id, product_type, size, quantity, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    user_id: i32,
    qr_code_id: i32,
    product_type: String,
    size: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            qr_code_id: QrCodeId::new(row.qr_code_id),
            product_type: row.product_type,
            size: size_from_column(row.size),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemWithQrCodeRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    qr_name: String,
    qr_short_code: String,
    qr_destination_url: String,
}

impl TryFrom<CartItemWithQrCodeRow> for CartItemWithQrCode {
    type Error = RepositoryError;

    fn try_from(row: CartItemWithQrCodeRow) -> Result<Self, Self::Error> {
        let short_code = ShortCode::parse(&row.qr_short_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid short code in database: {e}"))
        })?;
        let item = CartItem::from(row.item);
        Ok(Self {
            qr_code: QrCodeSummary {
                id: item.qr_code_id,
                name: row.qr_name,
                short_code,
                destination_url: row.qr_destination_url,
            },
            item,
        })
    }
}

#[async_trait]
impl CartStore for PgStore {
    #[instrument(skip(self))]
    async fn list_cart_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CartItemWithQrCode>, RepositoryError> {
        let rows: Vec<CartItemWithQrCodeRow> = sqlx::query_as(
            r"
            SELECT c.id, c.user_id, c.qr_code_id, c.product_type, c.size, c.quantity,
                   c.created_at, c.updated_at,
                   q.name AS qr_name,
                   q.short_code AS qr_short_code,
                   q.destination_url AS qr_destination_url
            FROM cart_items c
            JOIN qr_codes q ON q.id = c.qr_code_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(CartItemWithQrCode::try_from).collect()
    }

    #[instrument(skip(self, item), fields(user_id = %item.user_id, qr_code_id = %item.qr_code_id))]
    async fn upsert_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError> {
        // No row comes back when the merge guard rejects the update.
        let row: Option<CartItemRow> = sqlx::query_as(&format!(
            r"
            INSERT INTO cart_items (user_id, qr_code_id, product_type, size, quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, qr_code_id, product_type, size)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            WHERE cart_items.quantity + EXCLUDED.quantity <= $6
            RETURNING {CART_ITEM_COLUMNS}
            "
        ))
        .bind(item.user_id)
        .bind(item.qr_code_id)
        .bind(&item.product_type)
        .bind(item.size_key())
        .bind(item.quantity)
        .bind(MAX_QUANTITY_PER_LINE)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict("cart item".to_owned());
                }
            }
            RepositoryError::Database(e)
        })?;
        let Some(row) = row else {
            return Err(RepositoryError::LimitExceeded(format!(
                "cart line quantity above {MAX_QUANTITY_PER_LINE}"
            )));
        };

        debug!(id = row.id, quantity = row.quantity, "Upserted cart item");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row: Option<CartItemRow> = sqlx::query_as(&format!(
            r"
            UPDATE cart_items
            SET quantity = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {CART_ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CartItem::from))
    }

    #[instrument(skip(self))]
    async fn delete_cart_item(
        &self,
        id: CartItemId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn cart_quantity_total(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        Ok(total)
    }
}
