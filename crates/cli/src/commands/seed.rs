//! Reference data seeding.
//!
//! The API server seeds tiers on every start; this command does the same on
//! demand, e.g. after changing `BILLING_PRICE_STANDARD` / `BILLING_PRICE_PRO`.

use snaplist_api::config::BillingConfig;
use snaplist_api::db::PgStore;
use snaplist_api::services::membership::{default_tier_definitions, seed_membership_tiers};

use super::{CommandError, connect};

/// Insert or update the FREE / STANDARD / PRO tiers.
pub async fn tiers() -> Result<(), CommandError> {
    let pool = connect().await?;
    let store = PgStore::new(pool);

    let definitions = default_tier_definitions(&BillingConfig::from_env());
    let report = seed_membership_tiers(&store, &definitions).await;

    tracing::info!(
        inserted = report.inserted,
        updated = report.updated,
        "Tier seeding finished"
    );

    if report.is_success() {
        Ok(())
    } else {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(tier, error)| format!("{tier}: {error}"))
            .collect();
        Err(CommandError::Failed(format!(
            "failed to seed tiers: {}",
            failed.join("; ")
        )))
    }
}
