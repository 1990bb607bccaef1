//! Cart item types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use snaplist_core::{CartItemId, QrCodeId, UserId};

use super::qr_code::QrCodeSummary;

/// Most units a single cart line can hold.
pub const MAX_QUANTITY_PER_LINE: i32 = 999;

/// A pending purchase line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub qr_code_id: QrCodeId,
    pub product_type: String,
    /// `None` when the product has no size. Stored as `''`.
    pub size: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with the QR code printed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemWithQrCode {
    #[serde(flatten)]
    pub item: CartItem,
    pub qr_code: QrCodeSummary,
}

/// Input for adding to a cart. `size` must already be normalized with
/// [`normalize_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub qr_code_id: QrCodeId,
    pub product_type: String,
    pub size: Option<String>,
    pub quantity: i32,
}

impl NewCartItem {
    /// The value stored in `cart_items.size` and used in the uniqueness key.
    #[must_use]
    pub fn size_key(&self) -> &str {
        self.size.as_deref().unwrap_or("")
    }
}

/// Normalize an optional size: trimmed, with blank treated as no size.
#[must_use]
pub fn normalize_size(size: Option<&str>) -> Option<String> {
    size.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Convert a stored size column back into its optional form.
#[must_use]
pub fn size_from_column(size: String) -> Option<String> {
    if size.is_empty() { None } else { Some(size) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_size_treats_blank_as_none() {
        assert_eq!(normalize_size(None), None);
        assert_eq!(normalize_size(Some("")), None);
        assert_eq!(normalize_size(Some("   ")), None);
        assert_eq!(normalize_size(Some(" XL ")), Some("XL".to_string()));
    }

    #[test]
    fn test_size_key_matches_column() {
        let item = NewCartItem {
            user_id: UserId::new(1),
            qr_code_id: QrCodeId::new(2),
            product_type: "sticker".to_string(),
            size: None,
            quantity: 1,
        };
        assert_eq!(item.size_key(), "");
        assert_eq!(size_from_column(String::new()), None);
        assert_eq!(size_from_column("M".to_string()), Some("M".to_string()));
    }
}
