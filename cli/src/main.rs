//! CHARTTRAIL — audit chain verification CLI
//!
//! Replays hash-chained audit log segments and reports whether the chain
//! is intact.  Exits nonzero on the first tampered entry so the command
//! can drive scheduled integrity checks.
//!
//! Usage:
//!   cargo run -p charttrail-cli -- verify --dir /var/log/charttrail --category phi_access
//!   cargo run -p charttrail-cli -- verify --segment phi_access_2026-08-20.log.20260821T001500.gz

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use charttrail_contracts::LogCategory;
use charttrail_verify::{verify, verify_segment, Outcome};

// ── CLI definition ────────────────────────────────────────────────────────────

/// CHARTTRAIL — tamper-evident clinical audit trail.
#[derive(Parser)]
#[command(
    name = "charttrail",
    about = "CHARTTRAIL audit log tools",
    long_about = "Verifies the SHA-256 hash chain of CHARTTRAIL audit log segments.\n\
                  A valid chain proves no entry was altered, deleted, or reordered\n\
                  since it was written."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a segment's hash chain and report the first break, if any.
    Verify {
        /// Directory holding the audit log files.
        #[arg(long, default_value = "logs")]
        dir: PathBuf,

        /// Category whose live segment to verify.
        #[arg(long, default_value = "phi_access")]
        category: LogCategory,

        /// Segment date (YYYY-MM-DD).  Defaults to today (UTC).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Verify this exact segment file instead (live or rotated .gz).
        /// Overrides --dir/--category/--date.
        #[arg(long)]
        segment: Option<PathBuf>,

        /// Expected prev_hash of the first entry.  Without it, the first
        /// entry's embedded value is trusted.
        #[arg(long)]
        seed: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Verify {
            dir,
            category,
            date,
            segment,
            seed,
        } => {
            let result = match segment {
                Some(path) => verify_segment(&path, seed.as_deref()),
                None => {
                    let date = date.unwrap_or_else(|| Utc::now().date_naive());
                    verify(&dir, category, date, seed.as_deref())
                }
            };
            match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    eprintln!("verification error: {}", e);
                    std::process::exit(2);
                }
            }
        }
    };

    match outcome {
        Outcome::Valid { entries } => {
            println!("OK: chain intact ({} entries)", entries);
        }
        Outcome::Tampered { index, reason } => {
            println!("TAMPERED at entry {}: {}", index, reason);
            println!("entries from index {} onward are suspect", index);
            std::process::exit(1);
        }
    }
}
