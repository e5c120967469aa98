#![cfg_attr(docsrs, feature(doc_cfg))]
//! `alembic-check` verifies that a database's recorded [Alembic](https://alembic.sqlalchemy.org/)
//! revision is consistent with the migration scripts checked into a repository.
//!
//! It is a guard rail for CI pipelines, not a migration engine: nothing is ever written to the
//! database. The database's `alembic_version.version_num` is compared with the head revision of
//! the script directory, and the outcome is one of:
//!
//! - [Alignment::UpToDate] - the database is at the head revision.
//! - [Alignment::Pending] - the database is at an ancestor of the head, some number of
//!   migrations behind.
//! - [Alignment::Mismatch] - the database revision is not on the chain at all.
//!
//! [ComparisonPolicy::ExactMatch] only accepts the first outcome; [ComparisonPolicy::ChainWalk]
//! walks the `down_revision` pointers from the head to accept the second.
//!
//! # Example
//!
//! ```no_run
//! use alembic_check::{AlignmentChecker, ComparisonPolicy, DatabaseTarget, ScriptLocation};
//!
//! # fn main() -> Result<(), alembic_check::Error> {
//! let mut checker = AlignmentChecker::new(
//!     DatabaseTarget::Url("sqlite:///app.db".to_string()),
//!     ScriptLocation::Directory("migrations".into()),
//!     ComparisonPolicy::ChainWalk,
//! )?;
//! let report = checker.check()?;
//! println!("{}", report.message());
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! # Database support
//!
//! - [`SQLite`](sqlite) - available with the `sqlite` feature flag (default).
//! - [`MySQL`](mysql) - available with the `mysql` feature flag.
//! - [`PostgreSQL`](postgres) - available with the `postgres` feature flag.
//!
//! Tracing integration is available with the `tracing` feature flag.

mod core;
pub use crate::core::{
    evaluate_alignment, Alignment, ComparisonPolicy, RevisionLookup, RevisionRecord,
    VersionSource, ALEMBIC_VERSION_TABLE, VERSION_COLUMN,
};

mod error;
pub use error::Error;

mod checker;
pub use checker::{AlignmentChecker, AlignmentReport};

pub mod script;
pub use script::{ScriptDirectory, ScriptLocation};

pub mod settings;
pub use settings::{ConnectionSettings, DatabaseKind, DatabaseTarget, Endpoint};

#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite;

#[cfg(feature = "mysql")]
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
pub mod mysql;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

#[cfg(all(test, feature = "mysql", feature = "integration-tests"))]
pub(crate) mod test_mysql;

#[cfg(all(test, feature = "postgres", feature = "integration-tests"))]
pub(crate) mod test_postgres;
