//! `check-alembic-migration`: accepts any database revision on the chain behind the latest script.

use std::path::PathBuf;

use alembic_check::{
    AlignmentChecker, ComparisonPolicy, ConnectionSettings, DatabaseTarget, ScriptLocation,
};
use clap::Parser;

use crate::non_empty;

/// Check the Alembic version of the latest migration against the database and evaluate its
/// readiness. Supports PostgreSQL, MySQL, and SQLite databases.
#[derive(Parser)]
#[command(name = "check-alembic-migration", version)]
pub struct MigrationArgs {
    /// Database URL; overrides every other connection option
    #[arg(long = "db_url", env = "ALEMBIC_CHECK_DB_URL", hide_env_values = true)]
    pub db_url: Option<String>,
    /// Database type (postgresql, mysql, sqlite)
    #[arg(long = "db_type", env = "ALEMBIC_CHECK_DB_TYPE")]
    pub db_type: Option<String>,
    /// Database host
    #[arg(long = "db_host", env = "ALEMBIC_CHECK_DB_HOST")]
    pub db_host: Option<String>,
    /// Database port
    #[arg(long = "db_port", env = "ALEMBIC_CHECK_DB_PORT")]
    pub db_port: Option<String>,
    /// Database user
    #[arg(long = "db_user", env = "ALEMBIC_CHECK_DB_USER")]
    pub db_user: Option<String>,
    /// Database password
    #[arg(long = "db_password", env = "ALEMBIC_CHECK_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
    /// Database name (the file path for sqlite)
    #[arg(long = "db_name", env = "ALEMBIC_CHECK_DB_NAME")]
    pub db_name: Option<String>,
    /// Schema containing the alembic_version table
    #[arg(long = "alembic_version_table_schema")]
    pub alembic_version_table_schema: Option<String>,
    /// Path to the Alembic migrations folder
    #[arg(long = "migrations_path")]
    pub migrations_path: PathBuf,
}

impl std::fmt::Debug for MigrationArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationArgs")
            .field(
                "db_url",
                &self.db_url.as_deref().map(alembic_check::settings::redact_url),
            )
            .field("db_type", &self.db_type)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &self.db_password.as_ref().map(|_| "***"))
            .field("db_name", &self.db_name)
            .field(
                "alembic_version_table_schema",
                &self.alembic_version_table_schema,
            )
            .field("migrations_path", &self.migrations_path)
            .finish()
    }
}

impl MigrationArgs {
    /// The database to check: the URL if one was given, the separate settings otherwise.
    pub fn target(&self) -> DatabaseTarget {
        if let Some(url) = non_empty(self.db_url.clone()) {
            return DatabaseTarget::Url(url);
        }
        let piece = |value: &Option<String>| non_empty(value.clone()).unwrap_or_default();
        DatabaseTarget::Settings(ConnectionSettings {
            db_type: piece(&self.db_type),
            host: piece(&self.db_host),
            port: piece(&self.db_port),
            user: piece(&self.db_user),
            password: piece(&self.db_password),
            name: piece(&self.db_name),
        })
    }

    pub fn checker(&self) -> Result<AlignmentChecker, alembic_check::Error> {
        Ok(AlignmentChecker::new(
            self.target(),
            ScriptLocation::Directory(self.migrations_path.clone()),
            ComparisonPolicy::ChainWalk,
        )?
        .with_version_table_schema(non_empty(self.alembic_version_table_schema.clone())))
    }
}

/// Validate the arguments, run the evaluation, and return the exit code.
pub fn run(args: MigrationArgs) -> Result<i32, alembic_check::Error> {
    println!("Initializing the Alembic migration checker...");
    let checker = args.checker()?.on_progress(crate::print_progress);
    println!("Starting migration alignment evaluation...");
    crate::run_checker(checker)
}
