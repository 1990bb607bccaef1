//! In-memory implementation of every store trait.
//!
//! All state sits behind one `parking_lot::Mutex`, so each trait method is
//! atomic the way the equivalent single `PostgreSQL` statement or transaction
//! is. Uniqueness rules mirror the schema's unique indexes.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use snaplist_core::{
    CartItemId, Email, MembershipTierId, OrderId, OrderStatus, QrCodeId, ShortCode, TierName,
    UserId,
};

use crate::db::{
    CartStore, HealthCheck, OrderStore, QrCodeStore, RepositoryError, SubscriberStore, TierStore,
    UserStore,
};
use crate::models::cart::MAX_QUANTITY_PER_LINE;
use crate::models::{
    CartItem, CartItemWithQrCode, MembershipTier, NewCartItem, NewQrCode, NewUser,
    NewsletterSubscriber, Order, OrderItem, QrCode, TierDefinition, User,
};

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    users: Vec<StoredUser>,
    tiers: Vec<MembershipTier>,
    qr_codes: Vec<QrCode>,
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    subscribers: Vec<NewsletterSubscriber>,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backend for unit and router tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing_tier: Mutex<Option<TierName>>,
    unavailable: Mutex<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `tier` fail with a database error.
    pub fn fail_writes_for_tier(&self, tier: TierName) {
        *self.failing_tier.lock() = Some(tier);
    }

    /// Make the readiness ping fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Insert a user directly, bypassing password hashing.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address.
    pub fn seed_user(&self, email: &str, name: &str, tier: TierName) -> User {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let user = User {
            id: UserId::new(inner.next_id()),
            email: Email::parse(email).expect("test email should be valid"),
            name: name.to_owned(),
            membership_tier: tier,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(StoredUser {
            user: user.clone(),
            password_hash: String::new(),
        });
        user
    }

    /// Insert an active QR code directly.
    ///
    /// # Panics
    ///
    /// Panics if `short_code` is not a valid short code.
    pub fn seed_qr_code(&self, user_id: UserId, short_code: &str, name: &str, url: &str) -> QrCode {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let qr_code = QrCode {
            id: QrCodeId::new(inner.next_id()),
            user_id,
            short_code: ShortCode::parse(short_code).expect("test short code should be valid"),
            name: name.to_owned(),
            destination_url: url.to_owned(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.qr_codes.push(qr_code.clone());
        qr_code
    }

    /// Insert a cart line as-is, skipping the quantity limit the stores
    /// enforce on upsert. Lets tests build carts the API cannot.
    pub fn seed_cart_item(
        &self,
        user_id: UserId,
        qr_code_id: QrCodeId,
        product_type: &str,
        quantity: i32,
    ) -> CartItem {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let item = CartItem {
            id: CartItemId::new(inner.next_id()),
            user_id,
            qr_code_id,
            product_type: product_type.to_owned(),
            size: None,
            quantity,
            created_at: now,
            updated_at: now,
        };
        inner.cart.push(item.clone());
        item
    }

    pub fn set_qr_code_active(&self, id: QrCodeId, is_active: bool) {
        let mut inner = self.inner.lock();
        if let Some(qr_code) = inner.qr_codes.iter_mut().find(|q| q.id == id) {
            qr_code.is_active = is_active;
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    fn check_tier_writable(&self, tier: TierName) -> Result<(), RepositoryError> {
        if *self.failing_tier.lock() == Some(tier) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure for tier {tier}"
            ))));
        }
        Ok(())
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock();
        if inner.users.iter().any(|u| u.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let created = User {
            id: UserId::new(inner.next_id()),
            email: user.email.clone(),
            name: user.name.clone(),
            membership_tier: TierName::Free,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
        });
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn get_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }
}

#[async_trait]
impl TierStore for MemoryStore {
    async fn list_tiers(&self) -> Result<Vec<MembershipTier>, RepositoryError> {
        let mut tiers = self.inner.lock().tiers.clone();
        tiers.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.as_i32().cmp(&b.id.as_i32())));
        Ok(tiers)
    }

    async fn get_tier(&self, name: TierName) -> Result<Option<MembershipTier>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner.tiers.iter().find(|t| t.name == name).cloned())
    }

    async fn insert_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError> {
        self.check_tier_writable(tier.name)?;
        let mut inner = self.inner.lock();
        if inner.tiers.iter().any(|t| t.name == tier.name) {
            return Err(RepositoryError::Conflict(
                "membership tier already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let created = MembershipTier {
            id: MembershipTierId::new(inner.next_id()),
            name: tier.name,
            display_name: tier.display_name.clone(),
            price: tier.price,
            max_qr_codes: tier.max_qr_codes,
            has_analytics: tier.has_analytics,
            has_custom_branding: tier.has_custom_branding,
            has_api_access: tier.has_api_access,
            has_white_label: tier.has_white_label,
            billing_price_id: tier.billing_price_id.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.tiers.push(created.clone());
        Ok(created)
    }

    async fn update_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError> {
        self.check_tier_writable(tier.name)?;
        let mut inner = self.inner.lock();
        let existing = inner
            .tiers
            .iter_mut()
            .find(|t| t.name == tier.name)
            .ok_or(RepositoryError::NotFound)?;
        existing.display_name.clone_from(&tier.display_name);
        existing.price = tier.price;
        existing.max_qr_codes = tier.max_qr_codes;
        existing.has_analytics = tier.has_analytics;
        existing.has_custom_branding = tier.has_custom_branding;
        existing.has_api_access = tier.has_api_access;
        existing.has_white_label = tier.has_white_label;
        existing.billing_price_id.clone_from(&tier.billing_price_id);
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }
}

#[async_trait]
impl QrCodeStore for MemoryStore {
    async fn find_active_by_short_code(
        &self,
        code: &ShortCode,
    ) -> Result<Option<QrCode>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .qr_codes
            .iter()
            .find(|q| &q.short_code == code && q.is_active)
            .cloned())
    }

    async fn get_qr_code(
        &self,
        id: QrCodeId,
        user_id: UserId,
    ) -> Result<Option<QrCode>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .qr_codes
            .iter()
            .find(|q| q.id == id && q.user_id == user_id)
            .cloned())
    }

    async fn list_qr_codes(&self, user_id: UserId) -> Result<Vec<QrCode>, RepositoryError> {
        let mut codes: Vec<QrCode> = self
            .inner
            .lock()
            .qr_codes
            .iter()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut codes, |q| (q.created_at, q.id.as_i32()));
        Ok(codes)
    }

    async fn count_qr_codes(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let inner = self.inner.lock();
        let count = inner.qr_codes.iter().filter(|q| q.user_id == user_id).count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn insert_qr_code(&self, qr_code: &NewQrCode) -> Result<QrCode, RepositoryError> {
        let mut inner = self.inner.lock();
        if inner
            .qr_codes
            .iter()
            .any(|q| q.short_code == qr_code.short_code)
        {
            return Err(RepositoryError::Conflict("short code already exists".to_owned()));
        }
        let now = Utc::now();
        let created = QrCode {
            id: QrCodeId::new(inner.next_id()),
            user_id: qr_code.user_id,
            short_code: qr_code.short_code.clone(),
            name: qr_code.name.clone(),
            destination_url: qr_code.destination_url.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.qr_codes.push(created.clone());
        Ok(created)
    }

    async fn delete_qr_code(
        &self,
        id: QrCodeId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock();
        let before = inner.qr_codes.len();
        inner
            .qr_codes
            .retain(|q| !(q.id == id && q.user_id == user_id));
        let deleted = inner.qr_codes.len() < before;
        if deleted {
            inner.cart.retain(|c| c.qr_code_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn list_cart_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CartItemWithQrCode>, RepositoryError> {
        let inner = self.inner.lock();
        let mut items = inner
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let qr_code = inner
                    .qr_codes
                    .iter()
                    .find(|q| q.id == c.qr_code_id)
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "cart item {} references missing QR code",
                            c.id
                        ))
                    })?;
                Ok(CartItemWithQrCode {
                    item: c.clone(),
                    qr_code: qr_code.summary(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        newest_first(&mut items, |c| (c.item.created_at, c.item.id.as_i32()));
        Ok(items)
    }

    async fn upsert_cart_item(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError> {
        let mut inner = self.inner.lock();
        if !inner.qr_codes.iter().any(|q| q.id == item.qr_code_id) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        if let Some(existing) = inner.cart.iter_mut().find(|c| {
            c.user_id == item.user_id
                && c.qr_code_id == item.qr_code_id
                && c.product_type == item.product_type
                && c.size.as_deref().unwrap_or("") == item.size_key()
        }) {
            let merged = existing
                .quantity
                .checked_add(item.quantity)
                .filter(|q| *q <= MAX_QUANTITY_PER_LINE)
                .ok_or_else(|| {
                    RepositoryError::LimitExceeded(format!(
                        "cart line quantity above {MAX_QUANTITY_PER_LINE}"
                    ))
                })?;
            existing.quantity = merged;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let created = CartItem {
            id: CartItemId::new(inner.next_id()),
            user_id: item.user_id,
            qr_code_id: item.qr_code_id,
            product_type: item.product_type.clone(),
            size: item.size.clone(),
            quantity: item.quantity,
            created_at: now,
            updated_at: now,
        };
        inner.cart.push(created.clone());
        Ok(created)
    }

    async fn update_cart_item_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut inner = self.inner.lock();
        Ok(inner
            .cart
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .map(|c| {
                c.quantity = quantity;
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn delete_cart_item(
        &self,
        id: CartItemId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.lock();
        let before = inner.cart.len();
        inner.cart.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(inner.cart.len() < before)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock();
        let before = inner.cart.len();
        inner.cart.retain(|c| c.user_id != user_id);
        Ok((before - inner.cart.len()) as u64)
    }

    async fn cart_quantity_total(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| i64::from(c.quantity))
            .sum())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order_from_cart(
        &self,
        user_id: UserId,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.inner.lock();
        if inner.orders.iter().any(|o| o.order_number == order_number) {
            return Err(RepositoryError::Conflict("order number already exists".to_owned()));
        }
        let mut owned = inner.cart.iter().filter(|c| c.user_id == user_id).peekable();
        if owned.peek().is_none() {
            return Ok(None);
        }
        let item_count = owned
            .try_fold(0_i32, |total, c| total.checked_add(c.quantity))
            .ok_or_else(|| RepositoryError::LimitExceeded("order item count".to_owned()))?;

        let (mut lines, rest): (Vec<CartItem>, Vec<CartItem>) = std::mem::take(&mut inner.cart)
            .into_iter()
            .partition(|c| c.user_id == user_id);
        inner.cart = rest;
        lines.sort_by_key(|c| c.id.as_i32());

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(inner.next_id()),
            user_id,
            order_number: order_number.to_owned(),
            status: OrderStatus::Pending,
            item_count,
            created_at: now,
            updated_at: now,
        };
        for line in lines {
            inner.order_items.push(OrderItem {
                order_id: order.id,
                qr_code_id: line.qr_code_id,
                product_type: line.product_type,
                size: line.size,
                quantity: line.quantity,
            });
        }
        inner.orders.push(order.clone());
        Ok(Some(order))
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .inner
            .lock()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut orders, |o| (o.created_at, o.id.as_i32()));
        Ok(orders)
    }

    async fn list_order_items(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let inner = self.inner.lock();
        Ok(inner
            .order_items
            .iter()
            .filter(|i| order_ids.contains(&i.order_id))
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.inner.lock();
        Ok(inner
            .orders
            .iter_mut()
            .find(|o| o.order_number == order_number)
            .map(|o| {
                o.status = status;
                o.updated_at = Utc::now();
                o.clone()
            }))
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn upsert_subscriber(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<(NewsletterSubscriber, bool), RepositoryError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.subscribers.iter_mut().find(|s| &s.email == email) {
            if let Some(name) = name {
                existing.name = Some(name.to_owned());
            }
            return Ok((existing.clone(), false));
        }
        let subscriber = NewsletterSubscriber {
            email: email.clone(),
            name: name.map(str::to_owned),
            created_at: Utc::now(),
        };
        inner.subscribers.push(subscriber.clone());
        Ok((subscriber, true))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        if *self.unavailable.lock() {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
