mod actors;
mod engine;
mod ledger;
mod models;
mod notify;
mod storage;
mod types;

use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::engine::{LedgerEngine, DEFAULT_MINIMUM_WITHDRAWAL};
use crate::models::{CommissionStatus, WithdrawalStatus};
use crate::storage::MemoryStore;
use crate::types::{AffiliatorId, Monetary};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: commission-ledger [events].csv [log_level:optional] > [report].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        eprintln!("Set MINIMUM_WITHDRAWAL to override the minimum withdrawal amount (default: {DEFAULT_MINIMUM_WITHDRAWAL})");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let store = Arc::new(MemoryStore::new());
    let engine = LedgerEngine::new(store.clone())
        .with_minimum_withdrawal(minimum_withdrawal_from_env());

    let timer = Instant::now();
    engine.run(path).await?;
    engine.shutdown().await;
    let duration = timer.elapsed();

    info!("Processed ledger events in: {duration:?}");

    write_report_to_stdout(store)?;

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

fn minimum_withdrawal_from_env() -> Monetary {
    let Ok(value) = std::env::var("MINIMUM_WITHDRAWAL") else {
        return DEFAULT_MINIMUM_WITHDRAWAL;
    };

    match Monetary::from_str(&value) {
        Ok(minimum) if minimum.is_positive() => minimum,
        _ => {
            eprintln!("Invalid MINIMUM_WITHDRAWAL '{}', defaulting to {}", value, DEFAULT_MINIMUM_WITHDRAWAL);
            DEFAULT_MINIMUM_WITHDRAWAL
        }
    }
}

fn setup_logging(level: LevelFilter) {
    // stdout carries the report, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_report_to_stdout(store: Arc<MemoryStore>) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "affiliator,withdrawable,withdrawn")?;

    for affiliator_id in store.affiliator_ids() {
        let withdrawable = report_total(
            affiliator_id,
            "withdrawable",
            store.commissions_for(affiliator_id).iter()
                .filter(|record| record.status == CommissionStatus::Paid)
                .map(|record| record.remaining()),
        );

        let withdrawn = report_total(
            affiliator_id,
            "withdrawn",
            store.withdrawals_for(affiliator_id).iter()
                .filter(|withdrawal| matches!(withdrawal.status, WithdrawalStatus::Approved | WithdrawalStatus::Completed))
                .map(|withdrawal| withdrawal.amount),
        );

        writeln!(output, "{},{},{}", affiliator_id, withdrawable, withdrawn)?;
    }

    output.flush()?;

    Ok(())
}

fn report_total(
    affiliator_id: AffiliatorId,
    column: &str,
    values: impl Iterator<Item = Monetary>,
) -> Monetary {
    let mut total = Monetary::ZERO;

    for value in values {
        match total.checked_add(value) {
            Some(updated) => total = updated,
            None => {
                warn!("The {column} total for affiliator [{affiliator_id}] overflowed, reporting the saturated maximum");
                return Monetary::from_minor(i64::MAX);
            }
        }
    }

    total
}
