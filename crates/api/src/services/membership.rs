//! Membership tiers and their seeding.
//!
//! The three plans are fixed in code and reconciled into `membership_tiers`
//! by [`seed_membership_tiers`], which bootstrap and `snaplist-cli seed tiers`
//! call before anything reads the table.

use rust_decimal::Decimal;
use tracing::{error, info, instrument};

use snaplist_core::TierName;

use crate::config::BillingConfig;
use crate::db::{RepositoryError, TierStore};
use crate::models::{MembershipTier, TierDefinition};

/// QR code quota of the FREE plan. Also applied when a user's tier row is
/// missing.
pub const FREE_TIER_MAX_QR_CODES: i32 = 5;

/// QR code quota of the STANDARD plan.
pub const STANDARD_TIER_MAX_QR_CODES: i32 = 50;

/// Result of seeding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Number of tiers inserted.
    pub inserted: usize,
    /// Number of existing tiers updated.
    pub updated: usize,
    /// Tiers that could not be written (tier, error message).
    pub failed: Vec<(TierName, String)>,
}

impl SeedReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The canonical FREE / STANDARD / PRO definitions.
#[must_use]
pub fn default_tier_definitions(billing: &BillingConfig) -> Vec<TierDefinition> {
    vec![
        TierDefinition {
            name: TierName::Free,
            display_name: "Free".to_owned(),
            price: Decimal::ZERO,
            max_qr_codes: Some(FREE_TIER_MAX_QR_CODES),
            has_analytics: false,
            has_custom_branding: false,
            has_api_access: false,
            has_white_label: false,
            billing_price_id: None,
        },
        TierDefinition {
            name: TierName::Standard,
            display_name: "Standard".to_owned(),
            price: Decimal::new(999, 2),
            max_qr_codes: Some(STANDARD_TIER_MAX_QR_CODES),
            has_analytics: true,
            has_custom_branding: true,
            has_api_access: false,
            has_white_label: false,
            billing_price_id: billing.standard_price_id.clone(),
        },
        TierDefinition {
            name: TierName::Pro,
            display_name: "Pro".to_owned(),
            price: Decimal::new(2999, 2),
            max_qr_codes: None,
            has_analytics: true,
            has_custom_branding: true,
            has_api_access: true,
            has_white_label: true,
            billing_price_id: billing.pro_price_id.clone(),
        },
    ]
}

/// Insert each definition, or overwrite the existing row with the same name.
///
/// Tiers are processed in order; a failure on one tier is logged and recorded
/// in the report without stopping the rest.
#[instrument(skip_all, fields(count = definitions.len()))]
pub async fn seed_membership_tiers(
    store: &dyn TierStore,
    definitions: &[TierDefinition],
) -> SeedReport {
    let mut report = SeedReport::default();

    for definition in definitions {
        match seed_one(store, definition).await {
            Ok(Seeded::Inserted) => report.inserted += 1,
            Ok(Seeded::Updated) => report.updated += 1,
            Err(e) => {
                error!(tier = %definition.name, error = %e, "Failed to seed membership tier");
                report.failed.push((definition.name, e.to_string()));
            }
        }
    }

    info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failed.len(),
        "Seeded membership tiers"
    );
    report
}

enum Seeded {
    Inserted,
    Updated,
}

async fn seed_one(
    store: &dyn TierStore,
    definition: &TierDefinition,
) -> Result<Seeded, RepositoryError> {
    if store.get_tier(definition.name).await?.is_some() {
        store.update_tier(definition).await?;
        return Ok(Seeded::Updated);
    }

    match store.insert_tier(definition).await {
        Ok(_) => Ok(Seeded::Inserted),
        // Another process inserted it between the lookup and the insert.
        Err(RepositoryError::Conflict(_)) => {
            store.update_tier(definition).await?;
            Ok(Seeded::Updated)
        }
        Err(e) => Err(e),
    }
}

/// The tier that governs a user's quota.
///
/// Falls back to the FREE row when the user's tier is missing from the table.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
pub async fn effective_tier(
    store: &dyn TierStore,
    name: TierName,
) -> Result<Option<MembershipTier>, RepositoryError> {
    if let Some(tier) = store.get_tier(name).await? {
        return Ok(Some(tier));
    }
    if name == TierName::Free {
        return Ok(None);
    }
    store.get_tier(TierName::Free).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{MemoryStore, test_config};

    fn definitions() -> Vec<TierDefinition> {
        default_tier_definitions(&test_config().billing)
    }

    #[test]
    fn test_default_definitions() {
        let defs = definitions();
        assert_eq!(
            defs.iter().map(|d| d.name).collect::<Vec<_>>(),
            TierName::ALL.to_vec()
        );
        assert_eq!(defs[0].billing_price_id, None);
        assert_eq!(defs[1].price.to_string(), "9.99");
        assert_eq!(defs[1].billing_price_id.as_deref(), Some("price_standard_test"));
        assert_eq!(defs[2].max_qr_codes, None);
        assert!(defs[2].has_white_label);
    }

    #[tokio::test]
    async fn test_seeding_twice_is_idempotent() {
        let store = MemoryStore::new();

        let first = seed_membership_tiers(&store, &definitions()).await;
        assert_eq!(first.inserted, 3);
        assert_eq!(first.updated, 0);

        let second = seed_membership_tiers(&store, &definitions()).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);
        assert!(second.is_success());

        assert_eq!(store.list_tiers().await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn test_second_run_applies_changed_definitions() {
        let store = MemoryStore::new();
        seed_membership_tiers(&store, &definitions()).await;

        let mut changed = definitions();
        changed[1].price = Decimal::new(1299, 2);
        changed[1].max_qr_codes = Some(75);
        changed[1].billing_price_id = Some("price_standard_v2".to_owned());
        seed_membership_tiers(&store, &changed).await;

        let standard = store
            .get_tier(TierName::Standard)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(standard.price, Decimal::new(1299, 2));
        assert_eq!(standard.max_qr_codes, Some(75));
        assert_eq!(standard.billing_price_id.as_deref(), Some("price_standard_v2"));
        assert_eq!(standard.display_name, "Standard");
    }

    #[tokio::test]
    async fn test_failing_tier_does_not_stop_others() {
        let store = MemoryStore::new();
        store.fail_writes_for_tier(TierName::Standard);

        let report = seed_membership_tiers(&store, &definitions()).await;

        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, TierName::Standard);
        let names: Vec<_> = store
            .list_tiers()
            .await
            .expect("list")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec![TierName::Free, TierName::Pro]);
    }

    #[tokio::test]
    async fn test_tiers_list_cheapest_first() {
        let store = MemoryStore::new();
        let mut defs = definitions();
        defs.reverse();
        seed_membership_tiers(&store, &defs).await;

        let names: Vec<_> = store
            .list_tiers()
            .await
            .expect("list")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, TierName::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_effective_tier_falls_back_to_free() {
        let store = MemoryStore::new();
        seed_membership_tiers(&store, &definitions()[..1]).await;

        let tier = effective_tier(&store, TierName::Pro)
            .await
            .expect("lookup")
            .expect("free fallback");
        assert_eq!(tier.name, TierName::Free);
    }
}
