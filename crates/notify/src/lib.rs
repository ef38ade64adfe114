//! Alert delivery channels.
//!
//! - [`Notifier`]: the delivery seam
//! - [`EmailNotifier`]: SMTP delivery via `lettre`
//! - [`ConsoleNotifier`]: stdout fallback for dry runs and
//!   unconfigured installs

pub mod console;
pub mod email;
pub mod traits;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;
pub use traits::{Alert, Notifier, NotifyError};
