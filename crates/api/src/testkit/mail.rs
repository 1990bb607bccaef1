//! Mail transports that never touch the network.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::services::email::{EmailError, MailTransport, OutgoingEmail};

/// Keeps every delivered message for later assertions.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingTransport {
    /// Messages delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

/// Rejects every message.
pub struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn deliver(&self, _email: &OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Transport("connection refused".to_owned()))
    }
}
