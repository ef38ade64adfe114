//! Notifier trait definition and shared error types.

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A rendered alert ready for delivery.
#[derive(Debug, Clone)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Trait for alert delivery channels.
///
/// Delivery is fire-and-forget from the caller's point of view: a
/// returned error is surfaced and logged, but nothing in the run is
/// rolled back because of it.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert through this channel.
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email", "console").
    fn channel_name(&self) -> &str;
}
