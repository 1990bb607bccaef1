//! Newsletter subscriber type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use snaplist_core::Email;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub email: Email,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
