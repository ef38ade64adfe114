//! Console notifier.
//!
//! Prints the alert digest to stdout. Used for dry runs and when no
//! alert recipient is configured, so an unconfigured install still
//! surfaces what it would have mailed.

use crate::traits::{Alert, Notifier, NotifyError};

#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        println!("{}", alert.subject);
        println!("{}", alert.body);
        tracing::info!(channel = "console", subject = %alert.subject, "alert printed");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "console"
    }
}
