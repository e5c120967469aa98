//! Command-line entry points for checking a database's Alembic revision in CI.
//!
//! Two binaries share this crate:
//!
//! - `check-alembic-migration` accepts the database being any number of migrations behind the
//!   latest script, as long as it sits on the script chain.
//! - `check-alembic-version` requires the database to be exactly at the latest script.
//!
//! Both print human-readable diagnostics to stdout and exit 0 on success, 1 otherwise.

use std::process;

use alembic_check::{AlignmentChecker, AlignmentReport};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod migration;
pub mod version;

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse the process arguments, exiting with status 1 on any usage error.
/// `--help` and `--version` still exit successfully.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                process::exit(1);
            }
        },
    }
}

/// Treat empty strings as absent; CI inputs pass unset values as `""`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Run the checker and print its report, returning the process exit code.
pub fn run_checker(mut checker: AlignmentChecker) -> Result<i32, alembic_check::Error> {
    println!("Using database {}", checker.endpoint().redacted_url());
    let report = checker.check()?;
    print_report(&report);
    Ok(report.exit_code())
}

fn print_report(report: &AlignmentReport) {
    println!();
    println!(
        "Latest Alembic migration version (revision): {}",
        report.latest_revision
    );
    println!("Current database Alembic version: {}", report.db_version);
    println!();
    println!("{}", report.message());
}

/// Print the error and exit with status 1, or exit with the checker's status.
pub fn exit_with(result: Result<i32, alembic_check::Error>) -> ! {
    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Check failed");
            eprintln!("\nERROR: {}", e);
            process::exit(1);
        }
    }
}

/// Progress callback that echoes to stdout.
pub(crate) fn print_progress(message: &str) {
    println!("{}", message);
}
