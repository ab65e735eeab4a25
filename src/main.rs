mod admin;
mod collapser;
mod config;
mod identity;
mod models;
mod reconciler;
mod source;
mod storage;
mod types;

use std::io::{stderr, stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::admin::{MaintenanceJob, Operator, Role};
use crate::config::Settings;
use crate::reconciler::SyncService;
use crate::source::{CachedSalesSource, FileSalesSource};
use crate::storage::{LedgerSnapshot, MemoryLedger, UserLocks};

#[derive(Debug, Parser)]
#[command(name = "sales-ledger-reconciler", version, about = "Imports Gestão Click sales into a ledger and collapses duplicates")]
struct Cli {
    /// error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "error")]
    log_level: String,

    /// Deadline for each ledger or source call, in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Most detail entries kept per report
    #[arg(long, global = true, default_value_t = 100)]
    max_details: usize,

    #[command(subcommand)]
    command: Command
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sync a user's sales from a JSON export into the ledger.
    Import {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        sales: PathBuf,
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 50)]
        page_size: usize
    },
    /// Merge duplicate wallets and transactions of a user.
    Cleanup {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        user: String,
        #[arg(long)]
        operator: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Member)]
        role: RoleArg,
        #[arg(long)]
        dry_run: bool
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Member
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Member => Role::Member
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let settings = Settings::default()
        .with_call_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_details(cli.max_details);
    let locks = Arc::new(UserLocks::new());
    let timer = Instant::now();

    match cli.command {
        Command::Import { ledger, sales, user, page_size } => {
            let store = Arc::new(MemoryLedger::from_snapshot(LedgerSnapshot::read_from(&ledger)?));
            let file_source = Arc::new(FileSalesSource::new(sales).with_page_size(page_size));
            let source = Arc::new(CachedSalesSource::new(file_source, &settings));
            let service = SyncService::new(store.clone(), source, locks, settings);

            let result = service.sync_user(&user).await;

            // Sales imported before a failure are kept.
            store.snapshot().write_to(&ledger)?;
            write_json_to_stdout(&result?)?;
        }
        Command::Cleanup { ledger, user, operator, role, dry_run } => {
            let store = Arc::new(MemoryLedger::from_snapshot(LedgerSnapshot::read_from(&ledger)?));
            let job = MaintenanceJob::new(store.clone(), locks, settings);

            let report = job.run(&Operator::new(operator, role.into()), &user, dry_run).await?;

            if !dry_run {
                store.snapshot().write_to(&ledger)?;
            }

            write_json_to_stdout(&report)?;
        }
    }

    info!("Finished in: {:?}", timer.elapsed());

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Reports go to stdout, so logging stays on stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_json_to_stdout<T: Serialize>(report: &T) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    serde_json::to_writer_pretty(&mut output, report)?;
    writeln!(output)?;
    output.flush()?;

    Ok(())
}
