//! Membership tier queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use snaplist_core::{MembershipTierId, TierName};

use super::{PgStore, RepositoryError, TierStore, conflict_on_unique};
use crate::models::{MembershipTier, TierDefinition};

const TIER_COLUMNS: &str = "id, name, display_name, price, max_qr_codes, has_analytics, \
     has_custom_branding, has_api_access, has_white_label, billing_price_id, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TierRow {
    id: i32,
    name: String,
    display_name: String,
    price: Decimal,
    max_qr_codes: Option<i32>,
    has_analytics: bool,
    has_custom_branding: bool,
    has_api_access: bool,
    has_white_label: bool,
    billing_price_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TierRow> for MembershipTier {
    type Error = RepositoryError;

    fn try_from(row: TierRow) -> Result<Self, Self::Error> {
        let name = row
            .name
            .parse::<TierName>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: MembershipTierId::new(row.id),
            name,
            display_name: row.display_name,
            price: row.price,
            max_qr_codes: row.max_qr_codes,
            has_analytics: row.has_analytics,
            has_custom_branding: row.has_custom_branding,
            has_api_access: row.has_api_access,
            has_white_label: row.has_white_label,
            billing_price_id: row.billing_price_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TierStore for PgStore {
    #[instrument(skip(self))]
    async fn list_tiers(&self) -> Result<Vec<MembershipTier>, RepositoryError> {
        let rows: Vec<TierRow> = sqlx::query_as(&format!(
            "SELECT {TIER_COLUMNS} FROM membership_tiers ORDER BY price ASC, id ASC"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(MembershipTier::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get_tier(&self, name: TierName) -> Result<Option<MembershipTier>, RepositoryError> {
        let row: Option<TierRow> = sqlx::query_as(&format!(
            "SELECT {TIER_COLUMNS} FROM membership_tiers WHERE name = $1"
        ))
        .bind(name.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(MembershipTier::try_from).transpose()
    }

    #[instrument(skip(self, tier), fields(tier = %tier.name))]
    async fn insert_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError> {
        let row: TierRow = sqlx::query_as(&format!(
            r"
            INSERT INTO membership_tiers
                (name, display_name, price, max_qr_codes, has_analytics,
                 has_custom_branding, has_api_access, has_white_label, billing_price_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TIER_COLUMNS}
            "
        ))
        .bind(tier.name.as_str())
        .bind(&tier.display_name)
        .bind(tier.price)
        .bind(tier.max_qr_codes)
        .bind(tier.has_analytics)
        .bind(tier.has_custom_branding)
        .bind(tier.has_api_access)
        .bind(tier.has_white_label)
        .bind(tier.billing_price_id.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "membership tier"))?;

        row.try_into()
    }

    #[instrument(skip(self, tier), fields(tier = %tier.name))]
    async fn update_tier(&self, tier: &TierDefinition) -> Result<MembershipTier, RepositoryError> {
        let row: Option<TierRow> = sqlx::query_as(&format!(
            r"
            UPDATE membership_tiers
            SET display_name = $2,
                price = $3,
                max_qr_codes = $4,
                has_analytics = $5,
                has_custom_branding = $6,
                has_api_access = $7,
                has_white_label = $8,
                billing_price_id = $9,
                updated_at = NOW()
            WHERE name = $1
            RETURNING {TIER_COLUMNS}
            "
        ))
        .bind(tier.name.as_str())
        .bind(&tier.display_name)
        .bind(tier.price)
        .bind(tier.max_qr_codes)
        .bind(tier.has_analytics)
        .bind(tier.has_custom_branding)
        .bind(tier.has_api_access)
        .bind(tier.has_white_label)
        .bind(tier.billing_price_id.as_deref())
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
