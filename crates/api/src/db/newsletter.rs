//! Newsletter subscriber queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use snaplist_core::Email;

use super::{PgStore, RepositoryError, SubscriberStore};
use crate::models::NewsletterSubscriber;

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    email: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
    inserted: bool,
}

#[async_trait]
impl SubscriberStore for PgStore {
    #[instrument(skip(self, name), fields(email = %email))]
    async fn upsert_subscriber(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<(NewsletterSubscriber, bool), RepositoryError> {
        // `xmax = 0` only holds for a freshly inserted tuple.
        let row: SubscriberRow = sqlx::query_as(
            r"
            INSERT INTO newsletter_subscribers (email, name)
            VALUES ($1, $2)
            ON CONFLICT (email)
            DO UPDATE SET name = COALESCE(EXCLUDED.name, newsletter_subscribers.name)
            RETURNING email, name, created_at, (xmax = 0) AS inserted
            ",
        )
        .bind(email)
        .bind(name)
        .fetch_one(self.pool())
        .await?;

        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok((
            NewsletterSubscriber {
                email,
                name: row.name,
                created_at: row.created_at,
            },
            row.inserted,
        ))
    }
}
