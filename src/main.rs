use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use antrian_watch::data::duration::format_duration;
use antrian_watch::data::ticket_status;
use antrian_watch::notify::render_status;
use antrian_watch::{
    CachedSource, FileStore, Monitor, Notifier, QueueSnapshot, QueueSource, RsuiiAdapter,
    Settings, Subscription, SubscriptionStore,
};

#[derive(Parser, Debug)]
#[command(name = "antrian-watch")]
#[command(about = "Watch hospital outpatient queues and report where a ticket stands")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Queue page URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Subscription store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log filter (e.g., "debug", "antrian_adapters=trace"). RUST_LOG wins if set.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the units offered by the site
    Units,

    /// List the practitioners of a unit
    Doctors {
        /// Unit code (see `units`)
        #[arg(short, long)]
        unit: String,
    },

    /// Show one practitioner's queue right now
    Status {
        #[arg(short, long)]
        unit: String,

        #[arg(short, long)]
        doctor: String,

        /// Ticket to estimate the wait for
        #[arg(short, long)]
        ticket: Option<String>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a subscription and print its first status
    Subscribe {
        /// Subscriber id (e.g., a chat id)
        #[arg(long)]
        id: String,

        #[arg(short, long)]
        unit: String,

        #[arg(short, long)]
        doctor: String,

        #[arg(short, long)]
        ticket: String,
    },

    /// Delete a subscription
    Unsubscribe {
        #[arg(long)]
        id: String,
    },

    /// List stored subscriptions
    List,

    /// Poll every stored subscription until Ctrl-C
    Watch {
        /// Polling interval (e.g., "60s", "2m")
        #[arg(long)]
        poll_interval: Option<String>,

        /// Re-send an unchanged status after this long (e.g., "10m")
        #[arg(long)]
        heartbeat: Option<String>,

        /// "stdout" or a JSON-lines file path
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(store) = args.store {
        settings.store_path = store;
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }
    if let Command::Watch {
        poll_interval,
        heartbeat,
        output,
    } = &args.command
    {
        if let Some(interval) = poll_interval {
            settings.poll_interval = interval.clone();
        }
        if let Some(heartbeat) = heartbeat {
            settings.heartbeat = heartbeat.clone();
        }
        if let Some(output) = output {
            settings.output = output.clone();
        }
    }
    settings.validate()?;

    init_tracing(&settings.log_level);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args.command, settings))
}

/// Logs go to stderr so stdout stays usable for output.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, settings: Settings) -> Result<()> {
    let adapter = RsuiiAdapter::builder()
        .endpoint(settings.endpoint.clone())
        .timeout(settings.request_timeout()?)
        .build();
    let source = Arc::new(CachedSource::new(adapter));

    match command {
        Command::Units => {
            for unit in source.units().await? {
                println!("{}\t{}", unit.code, unit.label);
            }
        }
        Command::Doctors { unit } => {
            let doctors = source.doctors(&unit).await?;
            if doctors.is_empty() {
                bail!("No practitioners listed for unit {unit}");
            }
            for doctor in doctors {
                println!("{}\t{}", doctor.code, doctor.label);
            }
        }
        Command::Status {
            unit,
            doctor,
            ticket,
            json,
        } => {
            let snapshot = source.snapshot(&unit, &doctor).await?;
            print_status(&snapshot, ticket.as_deref(), json)?;
        }
        Command::Subscribe {
            id,
            unit,
            doctor,
            ticket,
        } => {
            source.units().await?;
            source.doctors(&unit).await?;
            let unit_label = source.cached_unit_label(&unit);
            let doctor_label = source.cached_doctor_label(&unit, &doctor);
            if unit_label.is_none() || doctor_label.is_none() {
                tracing::warn!(unit = %unit, doctor = %doctor, "code not in the site's option lists");
            }

            let store = Arc::new(open_store(&settings).await?);
            let monitor = Monitor::builder(source, store).notifier(Notifier::Stdout).build();
            monitor
                .register(
                    Subscription::new(id, unit, doctor, ticket).with_labels(unit_label, doctor_label),
                )
                .await?;
            println!("Monitoring active. A running `antrian-watch watch` picks it up on its next poll.");
        }
        Command::Unsubscribe { id } => {
            let store = open_store(&settings).await?;
            match store.remove(&id).await? {
                Some(_) => println!("Monitoring stopped for {id}."),
                None => println!("No active monitoring for {id}."),
            }
        }
        Command::List => {
            let store = open_store(&settings).await?;
            let subscriptions = store.list().await?;
            if subscriptions.is_empty() {
                println!("No subscriptions.");
            }
            for sub in subscriptions {
                println!(
                    "{}\t{} / {}\tticket {}\tlast notified: {}",
                    sub.id,
                    sub.unit_display(),
                    sub.doctor_display(),
                    sub.ticket,
                    sub.last_notified_at_ms
                        .map(|ms| ms.to_string())
                        .unwrap_or_else(|| "never".to_string()),
                );
            }
        }
        Command::Watch { .. } => {
            let store = Arc::new(open_store(&settings).await?);
            let monitor = Monitor::builder(source, store)
                .notifier(Notifier::from_setting(&settings.output))
                .poll_interval(settings.poll_interval()?)
                .heartbeat(settings.heartbeat()?)
                .first_poll_delay(settings.first_poll_delay()?)
                .build();

            let started = monitor.start().await?;
            if started == 0 {
                tracing::warn!(
                    store = %settings.store_path.display(),
                    "no subscriptions to watch"
                );
            }
            println!(
                "Watching {started} subscription(s) every {}. Press Ctrl-C to stop.",
                format_duration(monitor.poll_interval())
            );

            let poll_interval = monitor.poll_interval();
            let mut resync =
                tokio::time::interval_at(tokio::time::Instant::now() + poll_interval, poll_interval);
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    signal = &mut ctrl_c => {
                        signal.context("Failed to listen for Ctrl-C")?;
                        break;
                    }
                    _ = resync.tick() => match monitor.sync().await {
                        Ok(0) => {}
                        Ok(started) => tracing::info!(started, "picked up new subscriptions"),
                        Err(e) => tracing::warn!(error = %e, "failed to re-read subscription store"),
                    },
                }
            }
            monitor.shutdown().await;
        }
    }

    Ok(())
}

async fn open_store(settings: &Settings) -> Result<FileStore> {
    FileStore::open(&settings.store_path)
        .await
        .with_context(|| format!("Failed to open {}", settings.store_path.display()))
}

fn print_status(snapshot: &QueueSnapshot, ticket: Option<&str>, json: bool) -> Result<()> {
    if json {
        let value = match ticket {
            Some(ticket) => serde_json::json!({
                "snapshot": snapshot,
                "ticket": ticket,
                "status": ticket_status(snapshot, ticket),
            }),
            None => serde_json::json!({ "snapshot": snapshot }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match ticket {
        Some(ticket) => {
            println!("{}", render_status(snapshot, ticket, &ticket_status(snapshot, ticket)));
        }
        None => {
            let current = if snapshot.current_number.is_empty() {
                "-"
            } else {
                &snapshot.current_number
            };
            println!("Total tickets: {}", snapshot.total_count);
            println!("Now serving: {current}");
            println!("Next: {}", join_entries(&snapshot.next_entries));
            println!("Skipped: {}", join_entries(&snapshot.skipped_entries));
            println!("Done: {}", join_entries(&snapshot.done_entries));
        }
    }
    Ok(())
}

fn join_entries(entries: &[antrian_watch::QueueEntry]) -> String {
    if entries.is_empty() {
        return "-".to_string();
    }
    entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
