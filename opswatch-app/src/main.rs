mod settings;

use anyhow::Result;
use clap::Parser;
use opswatch_core::customers::CustomerStore;
use opswatch_core::OpswatchResult;
use opswatch_feeds::{FeedEngine, FeedItem, FeedProfile};
use opswatch_monitor::{TicketPriority, TicketSink};
use opswatch_sla::SlaScheduler;
use settings::AppSettings;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "opswatch", version, about = "Opswatch — managed-service alert monitoring")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "opswatch.toml")]
    config: String,

    /// Customers file path (overrides config file)
    #[arg(long)]
    customers: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Generate a default config file and exit
    #[arg(long)]
    generate_config: bool,

    /// Dry-run: load config and customers, print a summary, exit
    #[arg(long)]
    dry_run: bool,

    /// Replay a JSON dump of parsed feed items through the feed engines
    #[arg(long)]
    feed_dump: Option<String>,
}

/// Ticket sink that only logs. The ticketing system client plugs in
/// behind the same trait; vendor monitors construct their own sink.
#[derive(Default)]
struct LogTicketSink {
    created: AtomicU64,
}

impl TicketSink for LogTicketSink {
    fn create_ticket(
        &self,
        title: &str,
        body: &str,
        priority: TicketPriority,
        tag: &str,
    ) -> OpswatchResult<String> {
        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        info!(title = %title, priority = %priority, tag = %tag, body_lines = body.lines().count(),
              "Ticket (log sink)");
        Ok(format!("log-{}", n))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Generate Config ──────────────────────────────────────────────
    if cli.generate_config {
        let config = AppSettings::default();
        config.save(&cli.config).map_err(|e| anyhow::anyhow!(e))?;
        println!("Default configuration written to {}", cli.config);
        return Ok(());
    }

    // ── Load Config ──────────────────────────────────────────────────
    let config = AppSettings::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: {}, using defaults", e);
        AppSettings::default()
    });

    let log_level = cli.log_level.as_deref().unwrap_or(&config.general.log_level);

    // ── Tracing ──────────────────────────────────────────────────────
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Opswatch v{}", env!("CARGO_PKG_VERSION"));

    // ── Customer Store ───────────────────────────────────────────────
    let customers_path = cli
        .customers
        .unwrap_or_else(|| config.general.customers_file.clone());
    let store = Arc::new(
        CustomerStore::load_or_default(&customers_path).map_err(|e| anyhow::anyhow!(e))?,
    );
    info!(customers = store.len(), path = %customers_path, "Customer store ready");

    if cli.dry_run {
        println!(
            "Config OK: {} customer entries, state dir '{}', sla {}, feeds {}",
            store.len(),
            config.general.state_dir,
            if config.sla.enabled { "on" } else { "off" },
            if config.feeds.enabled { "on" } else { "off" },
        );
        return Ok(());
    }

    let sink = LogTicketSink::default();

    // ── SLA Pass ─────────────────────────────────────────────────────
    if config.sla.enabled {
        let scheduler = SlaScheduler::new(store.clone());
        let due = scheduler.due_notifications(chrono::Utc::now().date_naive())?;
        for notification in &due {
            if let Err(e) =
                sink.create_ticket(&notification.text, &notification.text, TicketPriority::Normal, "sla")
            {
                warn!(customer = %notification.customer, error = %e, "SLA ticket failed");
            }
        }
        let report = scheduler.report();
        info!(
            fired = report.fired,
            one_shots = report.one_shots_consumed,
            skipped = report.unknown_intervals_skipped,
            "SLA pass complete"
        );
    }

    // ── Feed Replay ──────────────────────────────────────────────────
    if config.feeds.enabled {
        if let Some(path) = &cli.feed_dump {
            run_feed_dump(path, &config, store.as_ref())?;
        }
    }

    Ok(())
}

/// Run both feed engines over a dump of already-parsed items, keeping the
/// per-feed seen-sets and the last-poll cutoff in the state directory.
fn run_feed_dump(path: &str, config: &AppSettings, store: &CustomerStore) -> Result<()> {
    let items: Vec<FeedItem> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let state_dir = Path::new(&config.general.state_dir);
    std::fs::create_dir_all(state_dir)?;

    let cutoff_path = state_dir.join("feeds_last_poll.json");
    let since: i64 = if cutoff_path.exists() {
        serde_json::from_str(&std::fs::read_to_string(&cutoff_path)?)?
    } else {
        0
    };

    let customers = store.entries();
    for profile in [FeedProfile::ncsc(), FeedProfile::dtc()] {
        let seen_path = state_dir.join(format!("{}_seen.json", profile.name.to_lowercase()));
        let seen: Vec<String> = if seen_path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&seen_path)?)?
        } else {
            Vec::new()
        };

        let engine = FeedEngine::new(profile).with_seen(seen);
        let advisories = engine.new_items_since(&items, since, &customers);
        for advisory in &advisories {
            info!(
                feed = %advisory.feed,
                title = %advisory.title,
                priority = ?advisory.priority,
                audience = advisory.audience.len(),
                "New advisory"
            );
        }
        let report = engine.report();
        info!(
            feed = %report.feed,
            emitted = report.advisories_emitted,
            collapsed = report.duplicates_collapsed,
            malformed = report.malformed_skipped,
            "Feed processed"
        );
        std::fs::write(&seen_path, serde_json::to_string_pretty(&engine.seen_ids())?)?;
    }

    std::fs::write(
        &cutoff_path,
        serde_json::to_string(&chrono::Utc::now().timestamp())?,
    )?;
    Ok(())
}
