use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Feed endpoint used when `FEED_ENDPOINT` is not set.
pub const DEFAULT_FEED_ENDPOINT: &str = "https://realt.co/wp-json/realt/v1/products/for_sale";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub table: TableConfig,
    pub alert: AlertConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            feed: FeedConfig::from_env(),
            table: TableConfig::from_env(),
            alert: AlertConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  feed:   endpoint={}, timeout={}s", self.feed.endpoint, self.feed.timeout_secs);
        tracing::info!("  table:  path={}", self.table.path.display());
        tracing::info!(
            "  alert:  recipient={}, smtp={}:{}, tls={}",
            self.alert.recipient.as_deref().unwrap_or("(console)"),
            self.alert.smtp_host,
            self.alert.smtp_port,
            self.alert.smtp_tls,
        );
    }
}

// ── Feed ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl FeedConfig {
    fn from_env() -> Self {
        Self {
            endpoint: env_or("FEED_ENDPOINT", DEFAULT_FEED_ENDPOINT),
            timeout_secs: env_u64("FEED_TIMEOUT_SECS", 30),
        }
    }
}

// ── Table ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Path of the CSV ledger. The original sheet was named "Monitor".
    pub path: PathBuf,
}

impl TableConfig {
    fn from_env() -> Self {
        Self {
            path: PathBuf::from(env_or("TABLE_PATH", "monitor.csv")),
        }
    }
}

// ── Alert delivery ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Recipient address. Unset means alerts go to the console notifier.
    pub recipient: Option<String>,
    pub from: String,
    pub subject: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_tls: bool,
}

impl AlertConfig {
    fn from_env() -> Self {
        Self {
            recipient: env_opt("ALERT_RECIPIENT"),
            from: env_or("ALERT_FROM", "stockwatch@localhost"),
            subject: env_or("ALERT_SUBJECT", "\u{26a0}\u{fe0f} Stock Alert"),
            smtp_host: env_or("SMTP_HOST", "localhost"),
            smtp_port: env_u16("SMTP_PORT", 587),
            smtp_tls: env_bool("SMTP_TLS", true),
        }
    }

    /// Whether email delivery is configured at all.
    pub fn is_configured(&self) -> bool {
        self.recipient.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_config_unset_recipient_is_console() {
        let cfg = AlertConfig {
            recipient: None,
            from: "stockwatch@localhost".to_string(),
            subject: "subject".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_tls: true,
        };
        assert!(!cfg.is_configured());
    }

    #[test]
    fn env_bool_parses_common_spellings() {
        env::set_var("STOCKWATCH_TEST_BOOL", "1");
        assert!(env_bool("STOCKWATCH_TEST_BOOL", false));
        env::set_var("STOCKWATCH_TEST_BOOL", "false");
        assert!(!env_bool("STOCKWATCH_TEST_BOOL", true));
        env::remove_var("STOCKWATCH_TEST_BOOL");
        assert!(env_bool("STOCKWATCH_TEST_BOOL", true));
    }
}
