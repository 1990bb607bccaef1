//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`memory`] - `MemoryStore`, an in-memory backend for every store trait.
//! - [`mail`] - `RecordingTransport` and `FailingTransport`.

pub mod mail;
pub mod memory;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use secrecy::SecretString;

use crate::config::{AppConfig, BillingConfig, EmailConfig};
use crate::db::Stores;
use crate::services::email::{EmailService, MailTransport};
use crate::state::AppState;

pub use mail::{FailingTransport, RecordingTransport};
pub use memory::MemoryStore;

/// Base URL used by [`test_config`].
pub const TEST_BASE_URL: &str = "https://snaplist.test";

/// Email settings pointing at a non-existent relay.
#[must_use]
pub fn test_email_config() -> EmailConfig {
    EmailConfig {
        smtp_host: "smtp.snaplist.test".to_owned(),
        smtp_port: 587,
        smtp_username: "snaplist".to_owned(),
        smtp_password: SecretString::from("smtp-password"),
        from_address: "orders@snaplist.test".to_owned(),
        reply_to: Some("support@snaplist.test".to_owned()),
    }
}

/// Full application config for tests. Nothing here is ever dialled.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost/snaplist_test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: TEST_BASE_URL.to_owned(),
        session_secret: SecretString::from("k7Jp2QxR9vLm4TzW8nYc3HsB6fDg1AeU"),
        email: test_email_config(),
        billing: BillingConfig {
            standard_price_id: Some("price_standard_test".to_owned()),
            pro_price_id: Some("price_pro_test".to_owned()),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Everything a test needs to drive services or the router.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub mail: Arc<RecordingTransport>,
    pub state: AppState,
}

impl TestContext {
    /// Fresh in-memory stores and a recording mail transport.
    #[must_use]
    pub fn new() -> Self {
        let mail = Arc::new(RecordingTransport::default());
        Self::with_transport(mail.clone(), mail)
    }

    /// Like [`TestContext::new`] but with every email delivery failing.
    #[must_use]
    pub fn with_failing_mail() -> Self {
        Self::with_transport(Arc::new(RecordingTransport::default()), Arc::new(FailingTransport))
    }

    fn with_transport(mail: Arc<RecordingTransport>, transport: Arc<dyn MailTransport>) -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::from_backend(store.clone());
        let email = EmailService::new(transport, &config.email, &config.base_url);
        let state = AppState::new(config, stores, email);

        Self { store, mail, state }
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        self.state.stores()
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        self.state.email()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
