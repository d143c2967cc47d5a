//! Booking confirmation delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. If `SMTP_HOST`
//! is not set, [`EmailConfig::from_env`] returns `None` and the caller falls
//! back to [`LogDelivery`](super::LogDelivery).

use async_trait::async_trait;

use super::ConfirmationSender;
use crate::confirmation::BookingConfirmation;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The booking has no contact address.
    #[error("Booking {0} has no contact email")]
    NoRecipient(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@cinebook.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      | -                         |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `noreply@cinebook.local`  |
    /// | `SMTP_USER`     | no       | -                         |
    /// | `SMTP_PASSWORD` | no       | -                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends booking confirmation emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

/// Subject and plain-text body for a confirmation email.
pub fn render_confirmation(confirmation: &BookingConfirmation) -> (String, String) {
    let subject = format!("[Cinebook] Booking {} confirmed", confirmation.booking_code);
    let body = format!(
        "Your booking is confirmed.\n\n\
         Booking code: {}\n\
         Amount paid: {} VND\n\
         Payment: {} ({})\n",
        confirmation.booking_code,
        confirmation.amount,
        confirmation.transaction_id,
        confirmation.provider,
    );
    (subject, body)
}

#[async_trait]
impl ConfirmationSender for EmailDelivery {
    async fn send(&self, confirmation: &BookingConfirmation) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let to_email = confirmation
            .contact_email
            .as_deref()
            .ok_or_else(|| EmailError::NoRecipient(confirmation.booking_code.clone()))?;

        let (subject, body) = render_confirmation(confirmation);

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = to_email,
            booking_code = %confirmation.booking_code,
            "Booking confirmation email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmation(contact_email: Option<&str>) -> BookingConfirmation {
        BookingConfirmation {
            booking_id: 100,
            booking_code: "BK100".to_string(),
            contact_email: contact_email.map(str::to_string),
            amount: 150_000,
            transaction_id: "260301_100123456".to_string(),
            provider: "zalopay".to_string(),
        }
    }

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn rendered_body_lists_code_amount_and_transaction() {
        let (subject, body) = render_confirmation(&confirmation(Some("guest@example.com")));
        assert!(subject.contains("BK100"));
        assert!(body.contains("150000 VND"));
        assert!(body.contains("260301_100123456"));
    }

    #[tokio::test]
    async fn send_without_contact_fails_before_connecting() {
        let delivery = EmailDelivery::new(EmailConfig {
            smtp_host: "smtp.invalid".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            smtp_user: None,
            smtp_password: None,
        });

        let err = delivery.send(&confirmation(None)).await.unwrap_err();
        assert!(matches!(err, EmailError::NoRecipient(code) if code == "BK100"));
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}
