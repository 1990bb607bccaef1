//! Newsletter subscriptions.

use thiserror::Error;
use tracing::{info, instrument};

use snaplist_core::{Email, EmailError};

use crate::db::{RepositoryError, Stores};
use crate::services::email::EmailService;

const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Outcome of a subscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// `false` when the address was already subscribed.
    pub newly_subscribed: bool,
    pub confirmation_sent: bool,
}

/// Subscribe `email`, refreshing the stored name when one is given.
///
/// A confirmation goes out on every call so a repeated sign-up still gets a
/// reply.
///
/// # Errors
///
/// Returns `NewsletterError::InvalidEmail` for a malformed address.
#[instrument(skip(stores, mailer, name))]
pub async fn subscribe(
    stores: &Stores,
    mailer: &EmailService,
    email: &str,
    name: Option<&str>,
) -> Result<Subscription, NewsletterError> {
    let email = Email::parse(email)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if name.is_some_and(|n| n.chars().count() > MAX_NAME_LENGTH) {
        return Err(NewsletterError::NameTooLong);
    }

    let (subscriber, newly_subscribed) = stores.subscribers.upsert_subscriber(&email, name).await?;
    info!(newly_subscribed, "Newsletter subscription");

    let confirmation_sent = mailer
        .send_newsletter_confirmation(subscriber.email.as_str(), subscriber.name.as_deref())
        .await;

    Ok(Subscription {
        newly_subscribed,
        confirmation_sent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestContext;

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let ctx = TestContext::new();

        let first = subscribe(ctx.stores(), ctx.email(), "Ana@Example.com", Some("Ana"))
            .await
            .expect("subscribe");
        let second = subscribe(ctx.stores(), ctx.email(), "ana@example.com", None)
            .await
            .expect("subscribe again");

        assert!(first.newly_subscribed);
        assert!(!second.newly_subscribed);
        assert_eq!(ctx.store.subscriber_count(), 1);

        let sent = ctx.mail.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].text.contains("Hi Ana"));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_email() {
        let ctx = TestContext::new();

        assert!(matches!(
            subscribe(ctx.stores(), ctx.email(), "not-an-email", None).await,
            Err(NewsletterError::InvalidEmail(_))
        ));
        assert!(ctx.mail.sent().is_empty());
    }
}
