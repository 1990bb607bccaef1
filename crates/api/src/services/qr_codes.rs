//! QR code management.
//!
//! Creation validates the name and destination, enforces the owner's tier
//! quota, and assigns a random short code.

use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use snaplist_core::{QrCodeId, ShortCode, ShortCodeError, UserId};

use crate::db::{RepositoryError, Stores};
use crate::models::{NewQrCode, QrCode};
use crate::services::membership::{FREE_TIER_MAX_QR_CODES, effective_tier};

/// Longest accepted display name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Short code draws before giving up on collisions.
const MAX_SHORT_CODE_ATTEMPTS: usize = 5;

/// Errors that can occur during QR code operations.
#[derive(Debug, Error)]
pub enum QrCodeError {
    #[error("name must be 1 to {MAX_NAME_LENGTH} characters")]
    InvalidName,

    #[error("destination must be an absolute http or https URL")]
    InvalidDestination,

    #[error("your plan allows at most {limit} QR codes")]
    QuotaExceeded { limit: i32 },

    #[error("user not found")]
    UserNotFound,

    #[error("could not allocate a unique short code")]
    ShortCodeExhausted,

    #[error("generated short code is invalid: {0}")]
    ShortCode(#[from] ShortCodeError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// QR code operations over the store layer.
pub struct QrCodeService<'a> {
    stores: &'a Stores,
}

impl<'a> QrCodeService<'a> {
    #[must_use]
    pub const fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }

    /// Create a QR code for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `QrCodeError::InvalidName` or `QrCodeError::InvalidDestination`
    /// for bad input, `QrCodeError::QuotaExceeded` when the user's plan is
    /// full, and `QrCodeError::ShortCodeExhausted` if every generated code
    /// collided.
    #[instrument(skip(self, name, destination_url))]
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        destination_url: &str,
    ) -> Result<QrCode, QrCodeError> {
        let name = validate_name(name)?;
        let destination_url = validate_destination(destination_url)?;

        let user = self
            .stores
            .users
            .get_user(user_id)
            .await?
            .ok_or(QrCodeError::UserNotFound)?;
        let owned = self.stores.qr_codes.count_qr_codes(user_id).await?;
        let limit = match effective_tier(self.stores.tiers.as_ref(), user.membership_tier).await? {
            Some(tier) => tier.max_qr_codes,
            None => Some(FREE_TIER_MAX_QR_CODES),
        };
        if let Some(limit) = limit
            && owned >= i64::from(limit)
        {
            return Err(QrCodeError::QuotaExceeded { limit });
        }

        for attempt in 1..=MAX_SHORT_CODE_ATTEMPTS {
            let new_code = NewQrCode {
                user_id,
                short_code: generate_short_code()?,
                name: name.clone(),
                destination_url: destination_url.clone(),
            };
            match self.stores.qr_codes.insert_qr_code(&new_code).await {
                Ok(qr_code) => {
                    info!(id = %qr_code.id, short_code = %qr_code.short_code, "Created QR code");
                    return Ok(qr_code);
                }
                Err(RepositoryError::Conflict(_)) => {
                    warn!(attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(QrCodeError::ShortCodeExhausted)
    }

    /// The user's QR codes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QrCodeError::Repository` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<QrCode>, QrCodeError> {
        Ok(self.stores.qr_codes.list_qr_codes(user_id).await?)
    }

    /// Delete one of the user's QR codes. Deleting a missing code is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `QrCodeError::Repository` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, id: QrCodeId) -> Result<bool, QrCodeError> {
        Ok(self.stores.qr_codes.delete_qr_code(id, user_id).await?)
    }
}

fn validate_name(name: &str) -> Result<String, QrCodeError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(QrCodeError::InvalidName);
    }
    Ok(name.to_owned())
}

fn validate_destination(raw: &str) -> Result<String, QrCodeError> {
    let url = Url::parse(raw.trim()).map_err(|_| QrCodeError::InvalidDestination)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(QrCodeError::InvalidDestination);
    }
    Ok(url.into())
}

/// A random alphanumeric code of [`ShortCode::GENERATED_LENGTH`] characters.
fn generate_short_code() -> Result<ShortCode, ShortCodeError> {
    let raw: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ShortCode::GENERATED_LENGTH)
        .map(char::from)
        .collect();
    ShortCode::parse(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::membership::{default_tier_definitions, seed_membership_tiers};
    use crate::testkit::{TestContext, test_config};
    use snaplist_core::TierName;

    async fn seeded() -> TestContext {
        let ctx = TestContext::new();
        seed_membership_tiers(
            ctx.stores().tiers.as_ref(),
            &default_tier_definitions(&test_config().billing),
        )
        .await;
        ctx
    }

    #[test]
    fn test_generate_short_code_format() {
        for _ in 0..100 {
            let code = generate_short_code().expect("valid");
            assert_eq!(code.as_str().len(), 8);
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_validate_destination() {
        assert_eq!(
            validate_destination(" https://example.com/menu ").expect("valid"),
            "https://example.com/menu"
        );
        assert!(validate_destination("http://example.com").is_ok());
        assert!(validate_destination("ftp://example.com").is_err());
        assert!(validate_destination("javascript:alert(1)").is_err());
        assert!(validate_destination("/relative/path").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Menu ").expect("valid"), "Menu");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
        assert!(validate_name(&"é".repeat(100)).is_ok());
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let ctx = seeded().await;
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let service = QrCodeService::new(ctx.stores());

        let created = service
            .create(user.id, "Menu", "https://example.com/menu")
            .await
            .expect("create");

        assert!(created.is_active);
        let listed = service.list(user.id).await.expect("list");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_free_tier_quota_enforced() {
        let ctx = seeded().await;
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let service = QrCodeService::new(ctx.stores());

        for i in 0..FREE_TIER_MAX_QR_CODES {
            service
                .create(user.id, &format!("Code {i}"), "https://example.com")
                .await
                .expect("within quota");
        }

        let err = service
            .create(user.id, "One too many", "https://example.com")
            .await
            .expect_err("over quota");
        assert!(matches!(err, QrCodeError::QuotaExceeded { limit: 5 }));
    }

    #[tokio::test]
    async fn test_pro_tier_is_unlimited() {
        let ctx = seeded().await;
        let user = ctx.store.seed_user("pro@example.com", "Pro", TierName::Pro);
        let service = QrCodeService::new(ctx.stores());

        for i in 0..(FREE_TIER_MAX_QR_CODES + 3) {
            service
                .create(user.id, &format!("Code {i}"), "https://example.com")
                .await
                .expect("unlimited");
        }
    }

    #[tokio::test]
    async fn test_unseeded_tiers_use_free_quota() {
        let ctx = TestContext::new();
        let user = ctx.store.seed_user("ana@example.com", "Ana", TierName::Standard);
        let service = QrCodeService::new(ctx.stores());

        for i in 0..FREE_TIER_MAX_QR_CODES {
            service
                .create(user.id, &format!("Code {i}"), "https://example.com")
                .await
                .expect("within quota");
        }
        assert!(matches!(
            service.create(user.id, "Extra", "https://example.com").await,
            Err(QrCodeError::QuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let ctx = seeded().await;
        let ana = ctx.store.seed_user("ana@example.com", "Ana", TierName::Free);
        let ben = ctx.store.seed_user("ben@example.com", "Ben", TierName::Free);
        let service = QrCodeService::new(ctx.stores());

        let code = service
            .create(ana.id, "Menu", "https://example.com")
            .await
            .expect("create");

        assert!(!service.delete(ben.id, code.id).await.expect("delete"));
        assert!(service.delete(ana.id, code.id).await.expect("delete"));
        assert!(!service.delete(ana.id, code.id).await.expect("delete again"));
    }
}
