//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers alert digests as plain-text emails through an SMTP server.
//! Supports STARTTLS and implicit TLS connections.

use crate::traits::{Alert, Notifier, NotifyError};
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// Sends alerts as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
    /// Recipient mailbox.
    to: Mailbox,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// - `smtp_host`: SMTP server hostname.
    /// - `smtp_port`: Port; 465 always uses implicit TLS.
    /// - `tls`: STARTTLS on ports other than 465 when true; plain
    ///   connection when false.
    /// - `from`: Sender address (e.g. `"alerts@example.com"` or
    ///   `"Stockwatch <alerts@example.com>"`).
    /// - `to`: Recipient address.
    ///
    /// SMTP credentials are resolved from the `SMTP_USERNAME` and
    /// `SMTP_PASSWORD` environment variables. If both are set, they are
    /// passed to the transport; otherwise the connection is
    /// unauthenticated.
    pub fn from_config(
        smtp_host: &str,
        smtp_port: u16,
        tls: bool,
        from: &str,
        to: &str,
    ) -> Result<Self, NotifyError> {
        let from_mailbox: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let mut builder = if smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(smtp_port)
        } else if tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(smtp_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(smtp_port)
        };

        // Attach credentials from environment if available.
        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let transport = builder.build();

        Ok(Self {
            transport,
            from: from_mailbox,
            to: to_mailbox,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send the alert digest to the configured recipient.
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&alert.subject)
            .body(alert.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %alert.subject,
            to = %self.to,
            "alert delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_email_address() {
        let mailbox: Result<Mailbox, _> = "alice@example.com".parse();
        assert!(mailbox.is_ok());
    }

    #[test]
    fn parse_email_with_display_name() {
        let mailbox: Result<Mailbox, _> = "Alice <alice@example.com>".parse();
        assert!(mailbox.is_ok());
        let mb = mailbox.unwrap();
        assert_eq!(mb.email.to_string(), "alice@example.com");
    }

    #[test]
    fn from_config_valid() {
        let notifier = EmailNotifier::from_config(
            "smtp.example.com",
            587,
            true,
            "alerts@example.com",
            "admin@example.com",
        );
        assert!(notifier.is_ok());
    }

    #[test]
    fn from_config_invalid_from_address() {
        let result = EmailNotifier::from_config(
            "smtp.example.com",
            587,
            true,
            "bad-address",
            "admin@example.com",
        );
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Configuration error"), "got: {err}");
    }

    #[test]
    fn from_config_invalid_to_address() {
        let result = EmailNotifier::from_config(
            "smtp.example.com",
            587,
            true,
            "alerts@example.com",
            "not-valid",
        );
        assert!(result.is_err());
    }

    #[test]
    fn channel_name_is_email() {
        let notifier = EmailNotifier::from_config(
            "smtp.example.com",
            587,
            true,
            "alerts@example.com",
            "admin@example.com",
        )
        .unwrap();
        assert_eq!(notifier.channel_name(), "email");
    }

    #[test]
    fn from_config_implicit_tls_port() {
        let notifier = EmailNotifier::from_config(
            "smtp.example.com",
            465,
            true,
            "alerts@example.com",
            "admin@example.com",
        );
        assert!(notifier.is_ok());
    }

    #[test]
    fn from_config_no_tls() {
        let notifier = EmailNotifier::from_config(
            "smtp.example.com",
            25,
            false,
            "alerts@example.com",
            "admin@example.com",
        );
        assert!(notifier.is_ok());
    }
}
