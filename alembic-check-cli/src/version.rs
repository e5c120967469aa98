//! `check-alembic-version`: requires the database to be exactly at the latest script.

use std::path::PathBuf;

use alembic_check::script::ALEMBIC_INI;
use alembic_check::{
    AlignmentChecker, ComparisonPolicy, ConnectionSettings, DatabaseTarget, ScriptLocation,
};
use clap::Parser;

/// Check the Alembic version of the latest migration against the database.
/// Supports PostgreSQL, MySQL, and SQLite databases.
#[derive(Parser)]
#[command(name = "check-alembic-version", version)]
pub struct VersionArgs {
    /// Database type (postgresql, mysql, sqlite)
    #[arg(allow_hyphen_values = true)]
    pub db_type: String,
    #[arg(allow_hyphen_values = true)]
    pub db_host: String,
    #[arg(allow_hyphen_values = true)]
    pub db_port: String,
    #[arg(allow_hyphen_values = true)]
    pub db_user: String,
    #[arg(allow_hyphen_values = true)]
    pub db_password: String,
    /// Database name (the file path for sqlite)
    #[arg(allow_hyphen_values = true)]
    pub db_name: String,
    /// Folder containing alembic.ini
    #[arg(allow_hyphen_values = true)]
    pub migrations_path: PathBuf,
}

impl std::fmt::Debug for VersionArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionArgs")
            .field("db_type", &self.db_type)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"***")
            .field("db_name", &self.db_name)
            .field("migrations_path", &self.migrations_path)
            .finish()
    }
}

impl VersionArgs {
    pub fn checker(&self) -> Result<AlignmentChecker, alembic_check::Error> {
        let settings = ConnectionSettings {
            db_type: self.db_type.clone(),
            host: self.db_host.clone(),
            port: self.db_port.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            name: self.db_name.clone(),
        };
        AlignmentChecker::new(
            DatabaseTarget::Settings(settings),
            ScriptLocation::IniFile(self.migrations_path.join(ALEMBIC_INI)),
            ComparisonPolicy::ExactMatch,
        )
    }
}

/// Validate the arguments, compare the versions, and return the exit code.
pub fn run(args: VersionArgs) -> Result<i32, alembic_check::Error> {
    println!("Initializing the Alembic version checker...");
    let checker = args.checker()?.on_progress(crate::print_progress);
    println!("Comparing version between the latest migration and the database...");
    crate::run_checker(checker)
}
