//! Order queries.
//!
//! Checkout is one transaction whose first statement deletes the user's cart
//! rows and returns them. The order, its `item_count` and its `order_items`
//! are built from exactly those rows. A concurrent add-to-cart that commits
//! after the delete inserts a fresh row and stays in the cart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use snaplist_core::{OrderId, OrderStatus, QrCodeId, UserId};

use super::{OrderStore, PgStore, RepositoryError, conflict_on_unique};
use crate::models::cart::size_from_column;
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, order_number, status, item_count, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_number: String,
    status: String,
    item_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_number: row.order_number,
            status,
            item_count: row.item_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    qr_code_id: i32,
    product_type: String,
    size: String,
    quantity: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            order_id: OrderId::new(row.order_id),
            qr_code_id: QrCodeId::new(row.qr_code_id),
            product_type: row.product_type,
            size: size_from_column(row.size),
            quantity: row.quantity,
        }
    }
}

/// A cart row as removed by checkout.
#[derive(sqlx::FromRow)]
struct MovedLineRow {
    qr_code_id: i32,
    product_type: String,
    size: String,
    quantity: i32,
}

#[async_trait]
impl OrderStore for PgStore {
    #[instrument(skip(self))]
    async fn place_order_from_cart(
        &self,
        user_id: UserId,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let lines: Vec<MovedLineRow> = sqlx::query_as(
            r"
            WITH moved AS (
                DELETE FROM cart_items
                WHERE user_id = $1
                RETURNING id, qr_code_id, product_type, size, quantity
            )
            SELECT qr_code_id, product_type, size, quantity FROM moved ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }
        let Some(item_count) = lines
            .iter()
            .try_fold(0_i32, |total, line| total.checked_add(line.quantity))
        else {
            tx.rollback().await?;
            return Err(RepositoryError::LimitExceeded("order item count".to_owned()));
        };

        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders (user_id, order_number, status, item_count)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(order_number)
        .bind(OrderStatus::Pending.as_str())
        .bind(item_count)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number"))?;

        let mut qr_code_ids = Vec::with_capacity(lines.len());
        let mut product_types = Vec::with_capacity(lines.len());
        let mut sizes = Vec::with_capacity(lines.len());
        let mut line_quantities = Vec::with_capacity(lines.len());
        for line in lines {
            qr_code_ids.push(line.qr_code_id);
            product_types.push(line.product_type);
            sizes.push(line.size);
            line_quantities.push(line.quantity);
        }

        sqlx::query(
            r"
            INSERT INTO order_items (order_id, qr_code_id, product_type, size, quantity)
            SELECT $1, qr_code_id, product_type, size, quantity
            FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::TEXT[], $5::INTEGER[])
                AS line(qr_code_id, product_type, size, quantity)
            ",
        )
        .bind(row.id)
        .bind(&qr_code_ids)
        .bind(&product_types)
        .bind(&sizes)
        .bind(&line_quantities)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(order_number = %row.order_number, item_count, "Placed order from cart");
        row.try_into().map(Some)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self, order_ids), fields(orders = order_ids.len()))]
    async fn list_order_items(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT order_id, qr_code_id, product_type, size, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE order_number = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order_number)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(Order::try_from).transpose()
    }
}
