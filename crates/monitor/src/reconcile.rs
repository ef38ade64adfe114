//! The reconciliation pass.
//!
//! Walks the table in row order, pops the matching feed item for each
//! row, classifies the row's new status, evaluates its trigger
//! condition, and appends rows for whatever the feed reported that the
//! table does not track. All mutation is in-memory; the caller decides
//! when to write back.
//!
//! Alert gating lives here, on the row's `Sent` date:
//! - not-found lines are critical only if today is past `Sent`,
//! - low-stock and selling lines are critical if today is past `Sent`
//!   or the status just changed,
//! - condition triggers and untracked items are always critical.
//!
//! `Sent` advances to today whenever an alert line is pushed for the
//! row, critical or not, so one critical alert quiets the rest of the
//! day but the next day re-alerts.

use std::collections::HashMap;

use tracing::{debug, warn};

use stockwatch_condition::{evaluate, EvalCache, FactSource, Field, Value};
use stockwatch_core::RunContext;
use stockwatch_feed::FeedSnapshot;
use stockwatch_table::{Cell, Row, Table};

use crate::error::Result;
use crate::message::Message;
use crate::status::{classify, Status};

/// Columns a reconciliation pass mutates. Write-back pushes exactly
/// these unless rows were appended.
pub const WRITE_BACK_COLUMNS: [&str; 5] =
    ["Status", "Stock", "Max Purchase", "Checked", "Sent"];

/// Counters for one pass, for logs and the run report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub rows: usize,
    pub matched: usize,
    pub not_found: usize,
    pub low_stock: usize,
    pub selling: usize,
    pub triggered: usize,
    pub untracked: usize,
}

/// What one pass produced: the digest and the counters.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub message: Message,
    pub stats: ReconcileStats,
}

/// Facts for one row, exposed to the condition evaluator.
struct RowFacts {
    name: String,
    stock: f64,
    prev_stock: f64,
    max_purchase: f64,
    status: String,
}

impl FactSource for RowFacts {
    fn facts(&self, key: &str) -> Option<HashMap<Field, Value>> {
        if key != self.name {
            return None;
        }
        Some(HashMap::from([
            (Field::Stock, Value::Num(self.stock)),
            (Field::PrevStock, Value::Num(self.prev_stock)),
            (Field::MaxPurchase, Value::Num(self.max_purchase)),
            (Field::Status, Value::Str(self.status.clone())),
        ]))
    }
}

fn num(n: f64) -> String {
    Cell::Number(n).render()
}

/// Run one reconciliation pass over the loaded table.
///
/// The snapshot is consumed: matched items are popped row by row and
/// the leftovers become appended rows, so every feed item is used at
/// most once.
pub fn reconcile(
    table: &mut Table,
    mut snapshot: FeedSnapshot,
    ctx: RunContext,
) -> Result<ReconcileOutcome> {
    let time = snapshot.time;
    let mut message = Message::new();
    let mut stats = ReconcileStats {
        rows: table.row_count(),
        ..Default::default()
    };

    for index in 0..table.row_count() {
        let row = table.get_row(index)?;
        let name = row.render("Name").unwrap_or_default();
        let prev_status = row.render("Status").unwrap_or_default();
        let prev_stock = row.number("Stock").unwrap_or(0.0);
        let prev_sent = row.date("Sent");
        // Not yet alerted today. An empty Sent cell reads as never.
        let fresh = prev_sent.map_or(true, |sent| ctx.today > sent);

        let mut next = row.clone();
        next.set("Checked", time);

        let status;
        let stock_now;
        let max_now;

        match snapshot.take(&name) {
            None => {
                status = Status::NotFound;
                stock_now = 0.0;
                max_now = 0.0;
                message.push(fresh, &format!("NOT FOUND: {name}"));
                next.set("Status", status.label());
                next.set("Stock", stock_now);
                next.set("Max Purchase", max_now);
                next.set("Sent", ctx.today);
                stats.not_found += 1;
            }
            Some(item) => {
                status = classify(&item, prev_stock);
                stock_now = item.stock;
                max_now = item.max_purchase;
                next.set("Stock", stock_now);
                next.set("Max Purchase", max_now);
                next.set("Status", status.label());
                stats.matched += 1;

                let changed = status.label() != prev_status;
                match status {
                    Status::LowStock => {
                        message.push(
                            fresh || changed,
                            &format!("LOW STOCK: {} × {}", item.title, num(item.stock)),
                        );
                        next.set("Sent", ctx.today);
                        stats.low_stock += 1;
                    }
                    Status::Selling => {
                        message.push(
                            fresh || changed,
                            &format!(
                                "SELLING: {} {} -> {}",
                                item.title,
                                num(prev_stock),
                                num(item.stock)
                            ),
                        );
                        next.set("Sent", ctx.today);
                        stats.selling += 1;
                    }
                    // A pass-through label is not alert-worthy.
                    Status::Feed(_) | Status::NotFound => {}
                }
            }
        }

        let condition = next.render("Condition").unwrap_or_default();
        if !condition.trim().is_empty() {
            let facts = RowFacts {
                name: name.clone(),
                stock: stock_now,
                prev_stock,
                max_purchase: max_now,
                status: status.label().to_string(),
            };
            let mut cache = EvalCache::new();
            match evaluate(&condition, &name, &mut cache, &facts) {
                Ok(eval) if eval.triggered => {
                    let mut fragment = format!("TRIGGERED: {name} ({condition})");
                    for (symbol, value) in &eval.trace {
                        fragment.push_str(&format!("\n  {symbol} = {value}"));
                    }
                    let action = next.render("Action").unwrap_or_default();
                    if !action.trim().is_empty() {
                        fragment.push_str(&format!("\n  action: {action}"));
                    }
                    message.push(true, &fragment);
                    next.set("Sent", ctx.today);
                    stats.triggered += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        row = index,
                        name = %name,
                        error = %err,
                        "condition did not compile, skipping"
                    );
                }
            }
        }

        // A bad row update stays local: log it and move on, leaving the
        // row as it was for next run.
        if let Err(err) = table.update_row(index, &next) {
            warn!(row = index, name = %name, error = %err, "row update failed, leaving row unchanged");
            continue;
        }
        debug!(row = index, name = %name, status = %status, "row reconciled");
    }

    // Whatever the rows did not consume is untracked: alert and start
    // tracking it.
    let headers: Vec<String> =
        table.headers().iter().map(|h| h.to_string()).collect();
    for item in snapshot.products {
        message.push(
            true,
            &format!("UNTRACKED: {} × {}", item.title, num(item.stock)),
        );
        let mut row = Row::new();
        for header in &headers {
            let cell = match header.as_str() {
                "Name" => Cell::from(item.title.clone()),
                "Status" => Cell::from(item.status.to_uppercase()),
                "Stock" => Cell::from(item.stock),
                "Max Purchase" => Cell::from(item.max_purchase),
                "Checked" => Cell::from(time),
                "Sent" => Cell::from(ctx.today),
                "Ignore" => Cell::from(false),
                _ => Cell::Empty,
            };
            row.set(header.clone(), cell);
        }
        table.append_row(&row)?;
        stats.untracked += 1;
    }

    Ok(ReconcileOutcome { message, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use stockwatch_feed::FeedItem;
    use stockwatch_table::MemoryBackend;

    const HEADERS: [&str; 8] = [
        "Name",
        "Status",
        "Stock",
        "Max Purchase",
        "Checked",
        "Sent",
        "Condition",
        "Action",
    ];

    fn ctx() -> RunContext {
        RunContext::fixed(
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap(),
        )
    }

    fn snapshot(products: Vec<FeedItem>) -> FeedSnapshot {
        FeedSnapshot {
            time: Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap(),
            products,
        }
    }

    fn item(title: &str, stock: f64, max_purchase: f64, status: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            stock,
            max_purchase,
            status: status.to_string(),
        }
    }

    fn load(rows: &[&[&str]]) -> Table {
        Table::load(&MemoryBackend::from_rows(&HEADERS, rows)).unwrap()
    }

    #[test]
    fn unmatched_row_goes_not_found_and_zeroes() {
        let mut table =
            load(&[&["Ghost", "ACTIVE", "5", "10", "", "2025-07-31", "", ""]]);
        let outcome = reconcile(&mut table, snapshot(vec![]), ctx()).unwrap();

        let row = table.get_row(0).unwrap();
        assert_eq!(row.text("Status"), Some("NOT FOUND"));
        assert_eq!(row.number("Stock"), Some(0.0));
        assert_eq!(row.number("Max Purchase"), Some(0.0));
        assert_eq!(
            row.date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
        );
        assert!(outcome.message.critical());
        assert_eq!(outcome.message.text(), "| NOT FOUND: Ghost");
        assert_eq!(outcome.stats.not_found, 1);
    }

    #[test]
    fn not_found_already_alerted_today_stays_quiet() {
        let mut table =
            load(&[&["Ghost", "NOT FOUND", "0", "0", "", "2025-08-01", "", ""]]);
        let outcome = reconcile(&mut table, snapshot(vec![]), ctx()).unwrap();

        assert!(!outcome.message.critical());
        assert_eq!(outcome.message.text(), "  NOT FOUND: Ghost");
    }

    #[test]
    fn empty_sent_cell_counts_as_never_alerted() {
        let mut table = load(&[&["Ghost", "ACTIVE", "5", "10", "", "", "", ""]]);
        let outcome = reconcile(&mut table, snapshot(vec![]), ctx()).unwrap();
        assert!(outcome.message.critical());
    }

    #[test]
    fn low_stock_alerts_and_advances_sent() {
        let mut table =
            load(&[&["X", "ACTIVE", "20", "10", "", "2025-07-31", "", ""]]);
        let feed = snapshot(vec![item("X", 8.0, 10.0, "active")]);
        let outcome = reconcile(&mut table, feed, ctx()).unwrap();

        let row = table.get_row(0).unwrap();
        assert_eq!(row.text("Status"), Some("LOW STOCK"));
        assert_eq!(row.number("Stock"), Some(8.0));
        assert_eq!(
            row.date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
        );
        assert!(outcome.message.critical());
        assert_eq!(outcome.message.text(), "| LOW STOCK: X × 8");
        assert_eq!(outcome.stats.low_stock, 1);
    }

    #[test]
    fn same_day_rerun_with_unchanged_feed_stays_quiet() {
        let mut table =
            load(&[&["X", "ACTIVE", "20", "10", "", "2025-07-31", "", ""]]);
        let first =
            reconcile(&mut table, snapshot(vec![item("X", 8.0, 10.0, "active")]), ctx())
                .unwrap();
        assert!(first.message.critical());

        // Second run, same day, same feed: status unchanged, Sent is
        // already today, so the line is pushed quietly.
        let second =
            reconcile(&mut table, snapshot(vec![item("X", 8.0, 10.0, "active")]), ctx())
                .unwrap();
        assert!(!second.message.critical());
        assert_eq!(second.message.text(), "  LOW STOCK: X × 8");
    }

    #[test]
    fn next_day_realerts_even_without_a_status_change() {
        let mut table =
            load(&[&["X", "LOW STOCK", "8", "10", "", "2025-08-01", "", ""]]);
        let tomorrow = RunContext::fixed(
            NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 2, 10, 0, 0).unwrap(),
        );
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 8.0, 10.0, "active")]),
            tomorrow,
        )
        .unwrap();
        assert!(outcome.message.critical());
    }

    #[test]
    fn status_transition_alerts_even_when_already_alerted_today() {
        // Alerted today as LOW STOCK, now the stock dropped from 40 to
        // 30 with a cap of 10: SELLING is a new status, so critical.
        let mut table =
            load(&[&["X", "LOW STOCK", "40", "10", "", "2025-08-01", "", ""]]);
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 30.0, 10.0, "active")]),
            ctx(),
        )
        .unwrap();

        assert_eq!(table.get_row(0).unwrap().text("Status"), Some("SELLING"));
        assert!(outcome.message.critical());
        assert_eq!(outcome.message.text(), "| SELLING: X 40 -> 30");
        assert_eq!(outcome.stats.selling, 1);
    }

    #[test]
    fn pass_through_label_is_quiet_and_keeps_sent() {
        let mut table =
            load(&[&["X", "ACTIVE", "30", "10", "", "2025-07-30", "", ""]]);
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 30.0, 10.0, "active")]),
            ctx(),
        )
        .unwrap();

        let row = table.get_row(0).unwrap();
        assert_eq!(row.text("Status"), Some("ACTIVE"));
        // No alert for this row, so Sent keeps its old date.
        assert_eq!(
            row.date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap())
        );
        assert!(outcome.message.is_empty());
        assert!(!outcome.message.critical());
    }

    #[test]
    fn checked_carries_the_snapshot_timestamp_for_every_row() {
        let mut table = load(&[
            &["X", "ACTIVE", "30", "10", "", "", "", ""],
            &["Ghost", "ACTIVE", "5", "10", "", "", "", ""],
        ]);
        let feed = snapshot(vec![item("X", 30.0, 10.0, "active")]);
        let time = feed.time;
        reconcile(&mut table, feed, ctx()).unwrap();

        for index in 0..table.row_count() {
            let row = table.get_row(index).unwrap();
            assert_eq!(row.timestamp("Checked"), Some(time));
        }
    }

    #[test]
    fn duplicate_names_consume_distinct_feed_items() {
        let mut table = load(&[
            &["Twin", "ACTIVE", "20", "10", "", "", "", ""],
            &["Twin", "ACTIVE", "20", "10", "", "", "", ""],
        ]);
        let feed = snapshot(vec![
            item("Twin", 8.0, 10.0, "active"),
            item("Twin", 3.0, 10.0, "active"),
        ]);
        let outcome = reconcile(&mut table, feed, ctx()).unwrap();

        assert_eq!(table.get_row(0).unwrap().number("Stock"), Some(8.0));
        assert_eq!(table.get_row(1).unwrap().number("Stock"), Some(3.0));
        assert_eq!(outcome.stats.matched, 2);
        assert_eq!(outcome.stats.untracked, 0);
    }

    #[test]
    fn leftover_feed_items_are_appended_as_untracked() {
        let mut table =
            load(&[&["X", "ACTIVE", "30", "10", "", "", "", ""]]);
        let feed = snapshot(vec![
            item("X", 30.0, 10.0, "active"),
            item("Maple 3", 12.0, 4.0, "coming soon"),
        ]);
        let time = feed.time;
        let outcome = reconcile(&mut table, feed, ctx()).unwrap();

        assert_eq!(outcome.stats.untracked, 1);
        assert_eq!(table.row_count(), 2);
        let row = table.get_row(1).unwrap();
        assert_eq!(row.text("Name"), Some("Maple 3"));
        assert_eq!(row.text("Status"), Some("COMING SOON"));
        assert_eq!(row.number("Stock"), Some(12.0));
        assert_eq!(row.number("Max Purchase"), Some(4.0));
        assert_eq!(row.timestamp("Checked"), Some(time));
        assert_eq!(
            row.date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
        );
        assert!(outcome.message.critical());
        assert_eq!(outcome.message.text(), "| UNTRACKED: Maple 3 × 12");
    }

    #[test]
    fn appended_rows_fill_an_ignore_column_when_present() {
        let headers = [
            "Name",
            "Status",
            "Stock",
            "Max Purchase",
            "Checked",
            "Sent",
            "Ignore",
        ];
        let backend = MemoryBackend::from_rows(&headers, &[]);
        let mut table = Table::load(&backend).unwrap();
        let feed = snapshot(vec![item("Maple 3", 12.0, 4.0, "active")]);
        reconcile(&mut table, feed, ctx()).unwrap();

        assert_eq!(table.get_row(0).unwrap().flag("Ignore"), Some(false));
    }

    #[test]
    fn condition_trigger_appends_trace_and_action() {
        let mut table = load(&[&[
            "X",
            "ACTIVE",
            "30",
            "10",
            "",
            "2025-08-01",
            "PREV_STOCK - STOCK >= 0",
            "check the listing",
        ]]);
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 30.0, 10.0, "active")]),
            ctx(),
        )
        .unwrap();

        assert!(outcome.message.critical());
        assert_eq!(
            outcome.message.text(),
            "| TRIGGERED: X (PREV_STOCK - STOCK >= 0)\n\
             |   PREV_STOCK = 30\n\
             |   STOCK = 30\n\
             |   action: check the listing"
        );
        assert_eq!(outcome.stats.triggered, 1);
        // A trigger advances Sent like any other alert.
        assert_eq!(
            table.get_row(0).unwrap().date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
        );
    }

    #[test]
    fn condition_sees_not_found_state() {
        let mut table = load(&[&[
            "Ghost",
            "ACTIVE",
            "5",
            "10",
            "",
            "2025-08-01",
            "STATUS == \"NOT FOUND\"",
            "",
        ]]);
        let outcome = reconcile(&mut table, snapshot(vec![]), ctx()).unwrap();

        let text = outcome.message.text();
        assert!(text.contains("| TRIGGERED: Ghost"));
        assert!(text.contains("|   STATUS = \"NOT FOUND\""));
    }

    #[test]
    fn untriggered_condition_leaves_no_trace() {
        let mut table = load(&[&[
            "X",
            "ACTIVE",
            "30",
            "10",
            "",
            "2025-07-30",
            "STOCK < 5",
            "",
        ]]);
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 30.0, 10.0, "active")]),
            ctx(),
        )
        .unwrap();

        assert!(outcome.message.is_empty());
        assert_eq!(outcome.stats.triggered, 0);
        // No alert means Sent stays put.
        assert_eq!(
            table.get_row(0).unwrap().date("Sent"),
            Some(NaiveDate::from_ymd_opt(2025, 7, 30).unwrap())
        );
    }

    #[test]
    fn malformed_condition_is_logged_not_fatal() {
        let mut table = load(&[&[
            "X", "ACTIVE", "30", "10", "", "", "STOCK <", "",
        ]]);
        let outcome = reconcile(
            &mut table,
            snapshot(vec![item("X", 30.0, 10.0, "active")]),
            ctx(),
        )
        .unwrap();

        assert_eq!(outcome.stats.triggered, 0);
        assert_eq!(table.get_row(0).unwrap().text("Status"), Some("ACTIVE"));
    }
}
