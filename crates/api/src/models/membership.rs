//! Membership tier types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use snaplist_core::{MembershipTierId, TierName};

/// A subscription plan as stored in `membership_tiers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipTier {
    pub id: MembershipTierId,
    pub name: TierName,
    pub display_name: String,
    /// Monthly price in USD.
    pub price: Decimal,
    /// Maximum QR codes a member may own; `None` means unlimited.
    pub max_qr_codes: Option<i32>,
    pub has_analytics: bool,
    pub has_custom_branding: bool,
    pub has_api_access: bool,
    pub has_white_label: bool,
    /// Price reference in the external billing provider.
    pub billing_price_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipTier {
    /// Whether a member who already owns `owned` codes may create another.
    #[must_use]
    pub fn allows_another_qr_code(&self, owned: i64) -> bool {
        self.max_qr_codes
            .is_none_or(|max| owned < i64::from(max))
    }
}

/// The mutable fields of a tier, as reconciled by seeding.
///
/// `name` is the natural key and is never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDefinition {
    pub name: TierName,
    pub display_name: String,
    pub price: Decimal,
    pub max_qr_codes: Option<i32>,
    pub has_analytics: bool,
    pub has_custom_branding: bool,
    pub has_api_access: bool,
    pub has_white_label: bool,
    pub billing_price_id: Option<String>,
}
