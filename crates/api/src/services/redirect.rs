//! Short code resolution for the redirect page.
//!
//! The server only reports where a code points. The client shows the QR
//! code's name, counts down [`REDIRECT_DELAY_SECONDS`] and navigates itself.

use serde::Serialize;
use tracing::{debug, instrument};

use snaplist_core::ShortCode;

use crate::db::{QrCodeStore, RepositoryError};

/// Countdown length shown before the client navigates.
pub const REDIRECT_DELAY_SECONDS: u32 = 5;

/// What the redirect page needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInfo {
    pub name: String,
    pub destination_url: String,
    pub short_code: ShortCode,
    pub redirect_delay_seconds: u32,
}

/// Resolve a raw short code to its active QR code.
///
/// Malformed, unknown and inactive codes all resolve to `None`.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
#[instrument(skip(store))]
pub async fn resolve(
    store: &dyn QrCodeStore,
    raw_code: &str,
) -> Result<Option<RedirectInfo>, RepositoryError> {
    let Ok(code) = ShortCode::parse(raw_code) else {
        debug!("Malformed short code");
        return Ok(None);
    };

    Ok(store
        .find_active_by_short_code(&code)
        .await?
        .map(|qr_code| RedirectInfo {
            name: qr_code.name,
            destination_url: qr_code.destination_url,
            short_code: qr_code.short_code,
            redirect_delay_seconds: REDIRECT_DELAY_SECONDS,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MemoryStore;
    use snaplist_core::TierName;

    #[tokio::test]
    async fn test_resolves_active_code() {
        let store = MemoryStore::new();
        let user = store.seed_user("ana@example.com", "Ana", TierName::Free);
        store.seed_qr_code(user.id, "aZ3kP9qL", "Menu", "https://example.com/menu");

        let info = resolve(&store, "aZ3kP9qL")
            .await
            .expect("lookup")
            .expect("found");

        assert_eq!(info.name, "Menu");
        assert_eq!(info.destination_url, "https://example.com/menu");
        assert_eq!(info.redirect_delay_seconds, 5);

        let json = serde_json::to_value(&info).expect("serialize");
        assert_eq!(json["destinationUrl"], "https://example.com/menu");
        assert_eq!(json["shortCode"], "aZ3kP9qL");
        assert_eq!(json["redirectDelaySeconds"], 5);
    }

    #[tokio::test]
    async fn test_unknown_malformed_and_inactive_codes() {
        let store = MemoryStore::new();
        let user = store.seed_user("ana@example.com", "Ana", TierName::Free);
        let qr = store.seed_qr_code(user.id, "aZ3kP9qL", "Menu", "https://example.com/menu");

        assert!(resolve(&store, "nope1234").await.expect("lookup").is_none());
        assert!(resolve(&store, "../../etc").await.expect("lookup").is_none());
        assert!(resolve(&store, "").await.expect("lookup").is_none());
        assert!(resolve(&store, "azbkp9ql").await.expect("lookup").is_none());

        store.set_qr_code_active(qr.id, false);
        assert!(resolve(&store, "aZ3kP9qL").await.expect("lookup").is_none());
    }
}
