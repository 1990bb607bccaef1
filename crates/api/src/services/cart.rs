//! Cart service.
//!
//! Every operation is scoped by the owning user. Adding an item whose
//! `(qr_code_id, product_type, size)` already sits in the cart merges the
//! quantities instead of creating a second row.

use thiserror::Error;
use tracing::{debug, instrument, warn};

use snaplist_core::{CartItemId, QrCodeId, UserId};

use crate::db::{RepositoryError, Stores};
use crate::models::cart::{MAX_QUANTITY_PER_LINE, normalize_size};
use crate::models::{CartItem, CartItemWithQrCode, NewCartItem};

/// Attempts for the add-to-cart upsert before giving up on conflicts.
const MAX_UPSERT_ATTEMPTS: usize = 3;

/// Longest accepted product type.
const MAX_PRODUCT_TYPE_LENGTH: usize = 50;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("quantity must be between 1 and {MAX_QUANTITY_PER_LINE}")]
    InvalidQuantity,

    #[error("product type must be 1 to {MAX_PRODUCT_TYPE_LENGTH} characters")]
    InvalidProductType,

    #[error("QR code not found")]
    QrCodeNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A request to add a QR code product to the cart.
#[derive(Debug, Clone)]
pub struct AddToCart<'a> {
    pub qr_code_id: QrCodeId,
    pub product_type: &'a str,
    pub size: Option<&'a str>,
    pub quantity: i32,
}

/// Cart operations over the store layer.
pub struct CartService<'a> {
    stores: &'a Stores,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }

    /// All items in the user's cart with their QR codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn get_user_cart_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CartItemWithQrCode>, CartError> {
        Ok(self.stores.cart.list_cart_items(user_id).await?)
    }

    /// Add an item, merging with an existing row for the same product.
    ///
    /// A missing size and an empty size refer to the same row.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is outside
    /// `1..=MAX_QUANTITY_PER_LINE` or the merged line would be.
    /// Returns `CartError::QrCodeNotFound` if the user owns no such QR code.
    /// Returns `CartError::Repository` if the upsert keeps failing.
    #[instrument(skip(self, request), fields(qr_code_id = %request.qr_code_id))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        request: AddToCart<'_>,
    ) -> Result<CartItem, CartError> {
        if !(1..=MAX_QUANTITY_PER_LINE).contains(&request.quantity) {
            return Err(CartError::InvalidQuantity);
        }
        let product_type = request.product_type.trim();
        if product_type.is_empty() || product_type.chars().count() > MAX_PRODUCT_TYPE_LENGTH {
            return Err(CartError::InvalidProductType);
        }

        self.stores
            .qr_codes
            .get_qr_code(request.qr_code_id, user_id)
            .await?
            .ok_or(CartError::QrCodeNotFound)?;

        let item = NewCartItem {
            user_id,
            qr_code_id: request.qr_code_id,
            product_type: product_type.to_owned(),
            size: normalize_size(request.size),
            quantity: request.quantity,
        };

        let mut attempt = 1;
        loop {
            match self.stores.cart.upsert_cart_item(&item).await {
                Ok(row) => {
                    debug!(id = %row.id, quantity = row.quantity, "Added to cart");
                    return Ok(row);
                }
                Err(RepositoryError::NotFound) => return Err(CartError::QrCodeNotFound),
                Err(RepositoryError::LimitExceeded(_)) => return Err(CartError::InvalidQuantity),
                Err(RepositoryError::Conflict(reason)) if attempt < MAX_UPSERT_ATTEMPTS => {
                    warn!(attempt, %reason, "Cart upsert conflicted, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Set an item's quantity. A quantity of zero or less removes the item.
    ///
    /// Returns the updated item, or `None` when the item was removed or no
    /// item of this user matched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` above `MAX_QUANTITY_PER_LINE`.
    /// Returns `CartError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item_quantity(
        &self,
        item_id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<CartItem>, CartError> {
        if quantity <= 0 {
            self.remove_from_cart(item_id, user_id).await?;
            return Ok(None);
        }
        if quantity > MAX_QUANTITY_PER_LINE {
            return Err(CartError::InvalidQuantity);
        }

        Ok(self
            .stores
            .cart
            .update_cart_item_quantity(item_id, user_id, quantity)
            .await?)
    }

    /// Remove an item. Removing a missing item is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<(), CartError> {
        let deleted = self.stores.cart.delete_cart_item(item_id, user_id).await?;
        if !deleted {
            debug!("Cart item not found, nothing removed");
        }
        Ok(())
    }

    /// Remove every item from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CartError> {
        let deleted = self.stores.cart.clear_cart(user_id).await?;
        debug!(deleted, "Cleared cart");
        Ok(())
    }

    /// Total quantity across the user's cart; 0 when empty.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn get_cart_item_count(&self, user_id: UserId) -> Result<i64, CartError> {
        Ok(self.stores.cart.cart_quantity_total(user_id).await?)
    }
}
