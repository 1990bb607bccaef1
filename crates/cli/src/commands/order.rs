//! Order management commands.

use snaplist_api::config::{EmailConfig, load_base_url};
use snaplist_api::db::Stores;
use snaplist_api::services::email::EmailService;
use snaplist_api::services::orders::OrderService;
use snaplist_core::OrderStatus;

use super::{CommandError, connect};

/// Set an order's status and send the customer the status email.
///
/// A failed email is reported as a warning; the status change stands.
pub async fn set_status(order_number: &str, status: OrderStatus) -> Result<(), CommandError> {
    let pool = connect().await?;
    let email_config = EmailConfig::from_env()?;
    let base_url = load_base_url()?;
    let email = EmailService::smtp(&email_config, &base_url)
        .map_err(|e| CommandError::Failed(format!("SMTP setup failed: {e}")))?;
    let stores = Stores::postgres(pool);

    let change = OrderService::new(&stores, &email)
        .update_status(order_number, status)
        .await
        .map_err(|e| CommandError::Failed(e.to_string()))?;

    tracing::info!(
        order_number = %change.order.order_number,
        status = %change.order.status,
        "Order status updated"
    );
    if !change.email_sent {
        tracing::warn!("Customer notification was not delivered");
    }
    Ok(())
}
