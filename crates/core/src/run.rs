//! Per-run ambient values.
//!
//! The monitor captures the clock and a run id exactly once, at the start
//! of a pass, and threads them through the reconciler. Nothing below the
//! binary reads the clock directly, which keeps date-gate behavior
//! reproducible in tests.

use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

/// Ambient values for a single reconciliation pass.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    /// Unique id for this pass, threaded through log lines.
    pub run_id: Uuid,
    /// Wall-clock instant the pass started.
    pub now: DateTime<Utc>,
    /// Date-only "today" in the host timezone; the `Sent` dedup gate
    /// compares against this.
    pub today: NaiveDate,
}

impl RunContext {
    /// Capture the current clock.
    pub fn capture() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }

    /// Build a context with a fixed clock.
    ///
    /// Useful for testing and deterministic replay.
    pub fn fixed(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            now,
            today,
        }
    }
}
