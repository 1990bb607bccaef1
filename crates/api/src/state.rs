//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Stores;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Handlers reach persistence only through
/// [`Stores`], so the same router runs against `PostgreSQL` or the in-memory
/// testkit store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    stores: Stores,
    email: EmailService,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, stores: Stores, email: EmailService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                email,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get a reference to the transactional email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
