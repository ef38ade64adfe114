//! stockwatch — product feed monitor over a CSV tracking table.
//!
//! Reconciles a product-availability feed against a local CSV table,
//! flags stock drops and disappearances, evaluates per-row trigger
//! conditions, and emails a digest when anything critical happens.
//!
//! Subcommands:
//! - `run` — one monitor pass: fetch, reconcile, alert, write back
//! - `validate` — check the table layout and compile every condition
//! - `fetch` — print the current feed snapshot
//! - `show` — dump the tracking table

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use stockwatch_core::{config, Config, RunContext};
use stockwatch_feed::{FeedClient, HttpFeedClient};
use stockwatch_monitor as monitor;
use stockwatch_notify::{ConsoleNotifier, EmailNotifier, Notifier};
use stockwatch_table::{CsvBackend, MemoryBackend, Table};

// ── CLI ─────────────────────────────────────────────────────────────

/// Product feed monitor: watches a feed, updates a CSV table, alerts.
#[derive(Parser, Debug)]
#[command(name = "stockwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one monitor pass: fetch the feed, reconcile, alert, write back.
    Run {
        /// Reconcile and report, but skip alerts and table writes.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the table layout and compile every row condition.
    Validate,
    /// Fetch the feed once and print the snapshot.
    Fetch,
    /// Print the tracking table.
    Show {
        /// Print a built-in sample table instead of reading TABLE_PATH.
        #[arg(long)]
        demo: bool,
    },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    match cli.command {
        Command::Run { dry_run } => run_once(&config, dry_run).await,
        Command::Validate => validate(&config),
        Command::Fetch => fetch(&config).await,
        Command::Show { demo } => show(&config, demo),
    }
}

// ── run ─────────────────────────────────────────────────────────────

async fn run_once(config: &Config, dry_run: bool) -> anyhow::Result<()> {
    let backend = CsvBackend::new(&config.table.path);
    let feed = HttpFeedClient::new(&config.feed.endpoint, config.feed.timeout_secs)
        .context("failed to build feed client")?;
    let notifier = build_notifier(config)?;
    let ctx = RunContext::capture();

    let report = monitor::run(
        &backend,
        &feed,
        notifier.as_ref(),
        &config.alert.subject,
        ctx,
        dry_run,
    )
    .await
    .context("monitor run failed")?;

    if dry_run && !report.digest.is_empty() {
        println!("{}", report.digest);
    }
    Ok(())
}

/// Email when a recipient is configured, stdout otherwise.
fn build_notifier(config: &Config) -> anyhow::Result<Box<dyn Notifier>> {
    if config.alert.is_configured() {
        let recipient = config.alert.recipient.as_deref().unwrap_or_default();
        let notifier = EmailNotifier::from_config(
            &config.alert.smtp_host,
            config.alert.smtp_port,
            config.alert.smtp_tls,
            &config.alert.from,
            recipient,
        )
        .context("failed to build email notifier")?;
        Ok(Box::new(notifier))
    } else {
        warn!("ALERT_RECIPIENT not set, critical digests go to stdout");
        Ok(Box::new(ConsoleNotifier::new()))
    }
}

// ── validate ────────────────────────────────────────────────────────

fn validate(config: &Config) -> anyhow::Result<()> {
    let backend = CsvBackend::new(&config.table.path);
    let table = Table::load(&backend).context("failed to load table")?;
    println!("{}: {} rows", config.table.path.display(), table.row_count());

    let headers = table.headers();
    let mut problems = 0usize;

    for required in std::iter::once("Name").chain(monitor::WRITE_BACK_COLUMNS) {
        if !headers.contains(&required) {
            println!("missing column: {required}");
            problems += 1;
        }
    }

    for index in 0..table.row_count() {
        let row = table.get_row(index)?;
        let name = row.render("Name").unwrap_or_default();
        let text = row.render("Condition").unwrap_or_default();
        if text.trim().is_empty() {
            continue;
        }
        match stockwatch_condition::compile(&text) {
            Ok(condition) => {
                for symbol in condition.unknown_symbols() {
                    println!("row {index} ({name}): unknown symbol {symbol}");
                    problems += 1;
                }
            }
            Err(err) => {
                println!("row {index} ({name}): {err}");
                problems += 1;
            }
        }
    }

    if problems > 0 {
        anyhow::bail!("{problems} problem(s) in {}", config.table.path.display());
    }
    println!("ok");
    Ok(())
}

// ── fetch ───────────────────────────────────────────────────────────

async fn fetch(config: &Config) -> anyhow::Result<()> {
    let feed = HttpFeedClient::new(&config.feed.endpoint, config.feed.timeout_secs)
        .context("failed to build feed client")?;
    let snapshot = feed.fetch().await.context("feed fetch failed")?;

    println!("snapshot at {}", snapshot.time.to_rfc3339());
    for item in &snapshot.products {
        println!(
            "  {:<40} stock={} max_purchase={} status={}",
            item.title, item.stock, item.max_purchase, item.status
        );
    }
    println!("{} product(s)", snapshot.len());
    Ok(())
}

// ── show ────────────────────────────────────────────────────────────

fn show(config: &Config, demo: bool) -> anyhow::Result<()> {
    let table = if demo {
        Table::load(&demo_backend()).context("failed to load demo table")?
    } else {
        let backend = CsvBackend::new(&config.table.path);
        Table::load(&backend).context("failed to load table")?
    };

    let headers = table.headers();
    println!("{}", headers.join("\t"));
    for index in 0..table.row_count() {
        let row = table.get_row(index)?;
        let line: Vec<String> = headers
            .iter()
            .map(|name| row.render(name).unwrap_or_default())
            .collect();
        println!("{}", line.join("\t"));
    }
    Ok(())
}

/// Sample rows showing the expected column layout.
fn demo_backend() -> MemoryBackend {
    let headers = [
        "Name",
        "Status",
        "Stock",
        "Max Purchase",
        "Checked",
        "Sent",
        "Condition",
        "Action",
        "Ignore",
    ];
    MemoryBackend::from_rows(
        &headers,
        &[
            &["Loft 17b", "SELLING", "8", "10", "", "", "", "", "FALSE"],
            &[
                "OLD-49 Holden Ave",
                "LOW STOCK",
                "3",
                "4",
                "",
                "2025-07-30",
                "STOCK < 2",
                "check the listing",
                "FALSE",
            ],
        ],
    )
}
