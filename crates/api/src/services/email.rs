//! Transactional email.
//!
//! Messages are rendered from Askama HTML and plain-text templates and sent
//! as `multipart/alternative` over SMTP via lettre. Delivery is best effort:
//! [`EmailService::send_email`] logs failures and reports them as `false`.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{error, info, instrument};

use snaplist_core::OrderStatus;

use crate::config::EmailConfig;

/// Greeting used when a newsletter subscriber gave no name.
const DEFAULT_GREETING_NAME: &str = "there";

/// HTML template for order status emails.
#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusEmailHtml<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    status_label: &'a str,
    status_color: &'a str,
    status_message: &'a str,
}

/// Plain text template for order status emails.
#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusEmailText<'a> {
    customer_name: &'a str,
    order_number: &'a str,
    status_label: &'a str,
    status_message: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
    dashboard_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_confirmation.html")]
struct NewsletterConfirmationHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_confirmation.txt")]
struct NewsletterConfirmationText<'a> {
    name: &'a str,
}

/// Errors that can occur when building or sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Failure reported by a non-SMTP transport.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A rendered message before sender addresses are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// A message ready for a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub reply_to: Option<String>,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivers a single message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// SMTP delivery with STARTTLS and username/password auth.
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(
                email
                    .from
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(email.from.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
            .subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(reply_to.clone()))?,
            );
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html.clone()),
                ),
        )?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

/// Build the order status change message.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn order_status_message(
    to: &str,
    customer_name: &str,
    order_number: &str,
    status: OrderStatus,
) -> Result<EmailMessage, EmailError> {
    let html = OrderStatusEmailHtml {
        customer_name,
        order_number,
        status_label: status.label(),
        status_color: status.color(),
        status_message: status.message(),
    }
    .render()?;
    let text = OrderStatusEmailText {
        customer_name,
        order_number,
        status_label: status.label(),
        status_message: status.message(),
    }
    .render()?;

    Ok(EmailMessage {
        to: to.to_owned(),
        subject: format!("Order {order_number} - {}", status.label()),
        text,
        html,
    })
}

/// Build the welcome message sent after registration.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn welcome_message(to: &str, name: &str, base_url: &str) -> Result<EmailMessage, EmailError> {
    let dashboard_url = format!("{base_url}/dashboard");
    let html = WelcomeEmailHtml {
        name,
        dashboard_url: &dashboard_url,
    }
    .render()?;
    let text = WelcomeEmailText {
        name,
        dashboard_url: &dashboard_url,
    }
    .render()?;

    Ok(EmailMessage {
        to: to.to_owned(),
        subject: "Welcome to SnapList!".to_owned(),
        text,
        html,
    })
}

/// Build the newsletter subscription confirmation.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn newsletter_confirmation_message(
    to: &str,
    name: Option<&str>,
) -> Result<EmailMessage, EmailError> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_GREETING_NAME);
    let html = NewsletterConfirmationHtml { name }.render()?;
    let text = NewsletterConfirmationText { name }.render()?;

    Ok(EmailMessage {
        to: to.to_owned(),
        subject: "You're subscribed to the SnapList newsletter".to_owned(),
        text,
        html,
    })
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn MailTransport>,
    from_address: String,
    reply_to: Option<String>,
    base_url: String,
}

impl EmailService {
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, config: &EmailConfig, base_url: &str) -> Self {
        Self {
            transport,
            from_address: config.from_address.clone(),
            reply_to: config.reply_to.clone(),
            base_url: base_url.to_owned(),
        }
    }

    /// SMTP-backed service.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn smtp(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let transport = SmtpMailTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config, base_url))
    }

    /// Send one message. Failures are logged and reported as `false`.
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send_email(&self, message: EmailMessage) -> bool {
        let outgoing = OutgoingEmail {
            from: self.from_address.clone(),
            reply_to: self.reply_to.clone(),
            to: message.to,
            subject: message.subject,
            text: message.text,
            html: message.html,
        };

        match self.transport.deliver(&outgoing).await {
            Ok(()) => {
                info!("Email sent successfully");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to send email");
                false
            }
        }
    }

    /// Notify a customer that their order changed status.
    pub async fn send_order_status_email(
        &self,
        to: &str,
        customer_name: &str,
        order_number: &str,
        status: OrderStatus,
    ) -> bool {
        match order_status_message(to, customer_name, order_number, status) {
            Ok(message) => self.send_email(message).await,
            Err(e) => {
                error!(error = %e, order_number, "Failed to render order status email");
                false
            }
        }
    }

    pub async fn send_welcome_email(&self, to: &str, name: &str) -> bool {
        match welcome_message(to, name, &self.base_url) {
            Ok(message) => self.send_email(message).await,
            Err(e) => {
                error!(error = %e, "Failed to render welcome email");
                false
            }
        }
    }

    pub async fn send_newsletter_confirmation(&self, to: &str, name: Option<&str>) -> bool {
        match newsletter_confirmation_message(to, name) {
            Ok(message) => self.send_email(message).await,
            Err(e) => {
                error!(error = %e, "Failed to render newsletter confirmation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::mail::{FailingTransport, RecordingTransport};
    use crate::testkit::test_email_config;

    fn service(transport: Arc<dyn MailTransport>) -> EmailService {
        EmailService::new(transport, &test_email_config(), "https://snaplist.test")
    }

    #[test]
    fn test_shipped_message_subject_and_body() {
        let message =
            order_status_message("ana@example.com", "Ana", "SL-7KQ2M9XA", OrderStatus::Shipped)
                .expect("renders");

        assert_eq!(message.subject, "Order SL-7KQ2M9XA - Shipped");
        assert!(message.text.contains("shipped and is on its way"));
        assert!(message.text.contains("Ana"));
        assert!(message.html.contains("#8b5cf6"));
        assert!(message.html.contains("SL-7KQ2M9XA"));
    }

    #[test]
    fn test_order_status_html_escapes_customer_name() {
        let message = order_status_message(
            "ana@example.com",
            "<script>",
            "SL-1",
            OrderStatus::Pending,
        )
        .expect("renders");

        assert!(!message.html.contains("<script>"));
        assert!(message.text.contains("<script>"));
    }

    #[test]
    fn test_welcome_links_dashboard() {
        let message =
            welcome_message("ana@example.com", "Ana", "https://snaplist.test").expect("renders");

        assert_eq!(message.subject, "Welcome to SnapList!");
        assert!(message.text.contains("https://snaplist.test/dashboard"));
    }

    #[test]
    fn test_newsletter_greeting_defaults() {
        let anonymous = newsletter_confirmation_message("a@example.com", None).expect("renders");
        assert!(anonymous.text.contains("Hi there"));

        let blank = newsletter_confirmation_message("a@example.com", Some("  ")).expect("renders");
        assert!(blank.text.contains("Hi there"));

        let named = newsletter_confirmation_message("a@example.com", Some("Ana")).expect("renders");
        assert!(named.text.contains("Hi Ana"));
    }

    #[tokio::test]
    async fn test_send_email_applies_sender_addresses() {
        let transport = Arc::new(RecordingTransport::default());
        let sent = service(transport.clone())
            .send_welcome_email("ana@example.com", "Ana")
            .await;

        assert!(sent);
        let outbox = transport.sent();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].from, "orders@snaplist.test");
        assert_eq!(outbox[0].reply_to.as_deref(), Some("support@snaplist.test"));
        assert_eq!(outbox[0].to, "ana@example.com");
    }

    #[tokio::test]
    async fn test_send_failure_returns_false() {
        let sent = service(Arc::new(FailingTransport))
            .send_order_status_email("ana@example.com", "Ana", "SL-1", OrderStatus::Delivered)
            .await;

        assert!(!sent);
    }
}
