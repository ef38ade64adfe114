//! One end-to-end monitoring run.

use tracing::{error, info};
use uuid::Uuid;

use stockwatch_core::RunContext;
use stockwatch_feed::FeedClient;
use stockwatch_notify::{Alert, Notifier};
use stockwatch_table::{Table, TableBackend};

use crate::error::Result;
use crate::reconcile::{reconcile, ReconcileStats, WRITE_BACK_COLUMNS};

/// Summary of one run, for the CLI and logs.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub stats: ReconcileStats,
    pub critical: bool,
    pub alert_sent: bool,
    pub digest: String,
}

/// Load, fetch, reconcile, alert, write back.
///
/// A load or fetch failure aborts before anything is written, so a
/// broken feed never floods the table with not-found rows. The alert
/// goes out before write-back; a delivery failure is logged and the
/// write-back still happens. With `dry_run` the pass stays entirely in
/// memory: no alert delivery, no write-back.
pub async fn run(
    backend: &dyn TableBackend,
    feed: &dyn FeedClient,
    notifier: &dyn Notifier,
    subject: &str,
    ctx: RunContext,
    dry_run: bool,
) -> Result<RunReport> {
    let mut table = Table::load(backend)?;
    info!(run_id = %ctx.run_id, rows = table.row_count(), "table loaded");

    let snapshot = feed.fetch().await?;
    info!(products = snapshot.len(), time = %snapshot.time, "feed snapshot fetched");

    let outcome = reconcile(&mut table, snapshot, ctx)?;
    let stats = outcome.stats.clone();
    let critical = outcome.message.critical();
    let digest = outcome.message.text();
    info!(
        matched = stats.matched,
        not_found = stats.not_found,
        low_stock = stats.low_stock,
        selling = stats.selling,
        triggered = stats.triggered,
        untracked = stats.untracked,
        critical,
        "reconciliation finished"
    );

    let mut alert_sent = false;
    if critical {
        if dry_run {
            info!("dry run, skipping alert delivery");
        } else {
            let alert = Alert::new(subject, digest.clone());
            match notifier.send(&alert).await {
                Ok(()) => alert_sent = true,
                // Fire-and-forget: the run still writes back so the
                // table reflects what was observed.
                Err(err) => {
                    error!(
                        channel = notifier.channel_name(),
                        error = %err,
                        "alert delivery failed"
                    );
                }
            }
        }
    }

    if dry_run {
        info!("dry run, skipping write-back");
    } else if stats.untracked > 0 {
        // Appends grew every column; a selective write would miss them.
        table.write_back_all(backend)?;
    } else {
        table.write_back(backend, &WRITE_BACK_COLUMNS)?;
    }

    Ok(RunReport {
        run_id: ctx.run_id,
        stats,
        critical,
        alert_sent,
        digest,
    })
}
