//! Persistence layer for the SnapList `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Accounts (email, argon2 password hash, membership tier)
//! - `membership_tiers` - FREE / STANDARD / PRO plans, unique on `name`
//! - `qr_codes` - Trackable codes, unique on `short_code`
//! - `cart_items` - Pending purchase lines, unique on
//!   `(user_id, qr_code_id, product_type, size)`
//! - `orders` / `order_items` - Checked-out carts
//! - `newsletter_subscribers` - Newsletter opt-ins, unique on `email`
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Stores
//!
//! Every aggregate is reached through a store trait so services and routes can
//! run against [`PgStore`] in production and the in-memory store from the
//! `testkit` module in tests. [`Stores`] bundles one handle per trait.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p snaplist-cli -- migrate
//! ```

pub mod cart_items;
pub mod membership_tiers;
pub mod newsletter;
pub mod orders;
pub mod qr_codes;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use snaplist_core::{
    CartItemId, Email, OrderId, OrderStatus, QrCodeId, ShortCode, TierName, UserId,
};

use crate::models::{
    CartItem, CartItemWithQrCode, MembershipTier, NewCartItem, NewQrCode, NewUser,
    NewsletterSubscriber, Order, OrderItem, QrCode, TierDefinition, User,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A write would push a bounded value past its limit.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Map a unique violation to `RepositoryError::Conflict`, anything else to
/// `RepositoryError::Database`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user on the FREE tier. `Conflict` if the email exists.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user and their password hash for login.
    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Membership tier storage, keyed by the unique tier name.
#[async_trait]
pub trait TierStore: Send + Sync {
    /// All tiers, cheapest first.
    async fn list_tiers(&self) -> Result<Vec<MembershipTier>, RepositoryError>;

    async fn get_tier(&self, name: TierName) -> Result<Option<MembershipTier>, RepositoryError>;

    /// Insert a tier. `Conflict` if the name already exists.
    async fn insert_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError>;

    /// Overwrite every mutable field of the tier named `tier.name`.
    /// `NotFound` if no such tier exists.
    async fn update_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError>;
}

/// QR code storage.
#[async_trait]
pub trait QrCodeStore: Send + Sync {
    /// Find an active QR code by short code.
    async fn find_active_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<QrCode>, RepositoryError>;

    /// Get a QR code owned by `user_id`.
    async fn get_qr_code(
        &self,
        id: QrCodeId,
        user_id: UserId,
    ) -> Result<Option<QrCode>, RepositoryError>;

    /// A user's QR codes, newest first.
    async fn list_qr_codes(&self, user_id: UserId) -> Result<Vec<QrCode>, RepositoryError>;

    async fn count_qr_codes(&self, user_id: UserId) -> Result<i64, RepositoryError>;

    /// Insert a QR code. `Conflict` if the short code is taken.
    async fn insert_qr_code(&self, qr_code: &NewQrCode) -> Result<QrCode, RepositoryError>;

    /// Delete a QR code owned by `user_id`. Returns whether a row was deleted.
    async fn delete_qr_code(&self, id: QrCodeId, user_id: UserId)
    -> Result<bool, RepositoryError>;
}

/// Cart item storage.
///
/// Every mutation is scoped by `user_id` so one user can never touch another
/// user's rows.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// A user's items joined with their QR codes, newest first.
    async fn list_cart_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CartItemWithQrCode>, RepositoryError>;

    /// Insert the item, or add its quantity to the row with the same
    /// `(user_id, qr_code_id, product_type, size)` key, in one statement.
    /// `LimitExceeded` if the merged quantity would pass
    /// [`MAX_QUANTITY_PER_LINE`](crate::models::cart::MAX_QUANTITY_PER_LINE);
    /// the row is left unchanged.
    async fn upsert_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError>;

    /// Set the quantity of an owned item. `None` if no row matched.
    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Delete an owned item. Returns whether a row was deleted.
    async fn delete_cart_item(&self, id: CartItemId, user_id: UserId)
    -> Result<bool, RepositoryError>;

    /// Delete all of a user's items. Returns the number deleted.
    async fn clear_cart(&self, user_id: UserId) -> Result<u64, RepositoryError>;

    /// Sum of quantities across a user's items.
    async fn cart_quantity_total(&self, user_id: UserId) -> Result<i64, RepositoryError>;
}

/// Order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically move the user's cart into a new pending order numbered
    /// `order_number`. `None` if the cart is empty. `Conflict` if the order
    /// number is taken. `LimitExceeded` if the total quantity does not fit
    /// in `item_count`; the cart is left untouched.
    async fn place_order_from_cart(
        &self,
        user_id: UserId,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    /// A user's orders, newest first.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Lines of the given orders, in checkout order within each order.
    async fn list_order_items(&self, order_ids: &[OrderId])
    -> Result<Vec<OrderItem>, RepositoryError>;

    /// Set an order's status. `None` if no order has that number.
    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError>;
}

/// Newsletter subscriber storage.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Insert or refresh a subscriber. Returns the subscriber and whether the
    /// email was new.
    async fn upsert_subscriber(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<(NewsletterSubscriber, bool), RepositoryError>;
}

/// Connectivity probe for readiness checks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// One handle per store trait.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tiers: Arc<dyn TierStore>,
    pub qr_codes: Arc<dyn QrCodeStore>,
    pub cart: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// Build every handle from a single backend implementing all traits.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore
            + TierStore
            + QrCodeStore
            + CartStore
            + OrderStore
            + SubscriberStore
            + HealthCheck
            + 'static,
    {
        Self {
            users: backend.clone(),
            tiers: backend.clone(),
            qr_codes: backend.clone(),
            cart: backend.clone(),
            orders: backend.clone(),
            subscribers: backend.clone(),
            health: backend,
        }
    }

    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }
}

/// `PostgreSQL` implementation of every store trait.
///
/// Queries are runtime-checked (`sqlx::query_as`) so the crate builds without
/// a live database or an offline query cache.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
