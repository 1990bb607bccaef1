//! Checkout and order status changes.

use rand::seq::IndexedRandom;
use thiserror::Error;
use tracing::{info, instrument, warn};

use snaplist_core::{OrderStatus, UserId};

use crate::db::{RepositoryError, Stores};
use crate::models::{Order, OrderWithItems};
use crate::services::email::EmailService;

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "SL-";

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ORDER_NUMBER_LENGTH: usize = 8;
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cart holds too many items for one order")]
    TooManyItems,

    #[error("order {0} not found")]
    NotFound(String),

    #[error("could not allocate a unique order number")]
    OrderNumberExhausted,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Outcome of a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    /// Whether the customer notification was delivered.
    pub email_sent: bool,
}

/// Order operations over the store layer.
pub struct OrderService<'a> {
    stores: &'a Stores,
    email: &'a EmailService,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores, email: &'a EmailService) -> Self {
        Self { stores, email }
    }

    /// Turn the user's cart into a pending order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if there is nothing to order and
    /// `OrderError::TooManyItems` if the total quantity cannot be recorded.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, OrderError> {
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order_number = generate_order_number();
            match self
                .stores
                .orders
                .place_order_from_cart(user_id, &order_number)
                .await
            {
                Ok(Some(order)) => return Ok(order),
                Ok(None) => return Err(OrderError::EmptyCart),
                Err(RepositoryError::LimitExceeded(_)) => return Err(OrderError::TooManyItems),
                Err(RepositoryError::Conflict(_)) => {
                    warn!(attempt, "Order number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(OrderError::OrderNumberExhausted)
    }

    /// The user's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, OrderError> {
        let orders = self.stores.orders.list_orders(user_id).await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        let items = self.stores.orders.list_order_items(&ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| OrderWithItems {
                items: items
                    .iter()
                    .filter(|i| i.order_id == order.id)
                    .cloned()
                    .collect(),
                order,
            })
            .collect())
    }

    /// Persist a new status and notify the customer.
    ///
    /// The notification is best effort; its outcome is reported in
    /// [`StatusChange::email_sent`].
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if no order has this number.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<StatusChange, OrderError> {
        let order = self
            .stores
            .orders
            .update_order_status(order_number, status)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_number.to_owned()))?;

        let email_sent = match self.stores.users.get_user(order.user_id).await? {
            Some(user) => {
                self.email
                    .send_order_status_email(user.email.as_str(), &user.name, order_number, status)
                    .await
            }
            None => {
                warn!(user_id = %order.user_id, "Order owner missing, skipping notification");
                false
            }
        };

        info!(status = %status, email_sent, "Updated order status");
        Ok(StatusChange { order, email_sent })
    }
}

/// `SL-` followed by eight characters that cannot be misread (no 0/O, 1/I).
fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_LENGTH)
        .filter_map(|_| ORDER_NUMBER_CHARSET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cart::{AddToCart, CartService};
    use crate::testkit::TestContext;
    use snaplist_core::TierName;

    async fn cart_with_items(ctx: &TestContext) -> UserId {
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let qr = ctx
            .store
            .seed_qr_code(user.id, "aZ3kP9qL", "Menu", "https://example.com/menu");
        let cart = CartService::new(ctx.stores());
        for (size, quantity) in [(Some("S"), 2), (Some("L"), 3)] {
            cart.add_to_cart(
                user.id,
                AddToCart {
                    qr_code_id: qr.id,
                    product_type: "t-shirt",
                    size,
                    quantity,
                },
            )
            .await
            .expect("add");
        }
        user.id
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("SL-"));
        let suffix = &number[3..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.bytes().all(|b| ORDER_NUMBER_CHARSET.contains(&b)));
    }

    #[tokio::test]
    async fn test_checkout_moves_cart_into_order() {
        let ctx = TestContext::new();
        let user_id = cart_with_items(&ctx).await;
        let orders = OrderService::new(ctx.stores(), ctx.email());

        let order = orders.checkout(user_id).await.expect("checkout");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.item_count, 5);
        assert_eq!(
            CartService::new(ctx.stores())
                .get_cart_item_count(user_id)
                .await
                .expect("count"),
            0
        );

        let history = orders.list(user_id).await.expect("list");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].order, order);
        let quantities: Vec<i32> = history[0].items.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, [2, 3]);
        assert_eq!(history[0].items[0].size.as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn test_history_keeps_lines_with_their_order() {
        let ctx = TestContext::new();
        let user_id = cart_with_items(&ctx).await;
        let orders = OrderService::new(ctx.stores(), ctx.email());
        let first = orders.checkout(user_id).await.expect("first checkout");

        let qr = ctx
            .store
            .seed_qr_code(user_id, "bQ7rT2xN", "Door", "https://example.com/door");
        ctx.store.seed_cart_item(user_id, qr.id, "poster", 4);
        let second = orders.checkout(user_id).await.expect("second checkout");

        let history = orders.list(user_id).await.expect("list");
        let by_number: Vec<(&str, usize)> = history
            .iter()
            .map(|o| (o.order.order_number.as_str(), o.items.len()))
            .collect();
        assert!(by_number.contains(&(first.order_number.as_str(), 2)));
        assert!(by_number.contains(&(second.order_number.as_str(), 1)));
    }

    #[tokio::test]
    async fn test_checkout_total_overflow_rejected_and_cart_kept() {
        let ctx = TestContext::new();
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let qr = ctx
            .store
            .seed_qr_code(user.id, "aZ3kP9qL", "Menu", "https://example.com/menu");
        ctx.store.seed_cart_item(user.id, qr.id, "sticker", i32::MAX);
        ctx.store.seed_cart_item(user.id, qr.id, "poster", 1);
        let orders = OrderService::new(ctx.stores(), ctx.email());

        assert!(matches!(
            orders.checkout(user.id).await,
            Err(OrderError::TooManyItems)
        ));

        assert!(orders.list(user.id).await.expect("list").is_empty());
        assert_eq!(
            CartService::new(ctx.stores())
                .get_cart_item_count(user.id)
                .await
                .expect("count"),
            i64::from(i32::MAX) + 1
        );
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_rejected() {
        let ctx = TestContext::new();
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let orders = OrderService::new(ctx.stores(), ctx.email());

        assert!(matches!(
            orders.checkout(user.id).await,
            Err(OrderError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_shipped_status_sends_email() {
        let ctx = TestContext::new();
        let user_id = cart_with_items(&ctx).await;
        let orders = OrderService::new(ctx.stores(), ctx.email());
        let order = orders.checkout(user_id).await.expect("checkout");

        let change = orders
            .update_status(&order.order_number, OrderStatus::Shipped)
            .await
            .expect("update");

        assert!(change.email_sent);
        assert_eq!(change.order.status, OrderStatus::Shipped);
        let sent = ctx.mail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert_eq!(
            sent[0].subject,
            format!("Order {} - Shipped", order.order_number)
        );
        assert!(sent[0].text.contains("shipped and is on its way"));
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_status_change() {
        let ctx = TestContext::with_failing_mail();
        let user_id = cart_with_items(&ctx).await;
        let orders = OrderService::new(ctx.stores(), ctx.email());
        let order = orders.checkout(user_id).await.expect("checkout");

        let change = orders
            .update_status(&order.order_number, OrderStatus::Delivered)
            .await
            .expect("update");

        assert!(!change.email_sent);
        assert_eq!(change.order.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_unknown_order_number() {
        let ctx = TestContext::new();
        let orders = OrderService::new(ctx.stores(), ctx.email());

        assert!(matches!(
            orders.update_status("SL-MISSING", OrderStatus::Shipped).await,
            Err(OrderError::NotFound(_))
        ));
    }
}
