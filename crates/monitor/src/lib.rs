//! Feed reconciliation against the tracked-products table.
//!
//! - [`Message`]: alert digest with a monotonic critical flag
//! - [`status`]: per-row status classification
//! - [`reconcile`]: one in-memory reconciliation pass
//! - [`run`]: the full load/fetch/reconcile/alert/write-back cycle

pub mod error;
pub mod message;
pub mod reconcile;
pub mod runner;
pub mod status;

pub use error::{MonitorError, Result};
pub use message::Message;
pub use reconcile::{reconcile, ReconcileOutcome, ReconcileStats, WRITE_BACK_COLUMNS};
pub use runner::{run, RunReport};
pub use status::{classify, Status, LOW_STOCK_FACTOR};
