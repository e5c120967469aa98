//! The alignment check shared by both command-line entry points.

use crate::core::{evaluate_alignment, Alignment, ComparisonPolicy, VersionSource};
use crate::error::Error;
use crate::script::{ScriptDirectory, ScriptLocation};
use crate::settings::{DatabaseKind, DatabaseTarget, Endpoint};

/// The result of one alignment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentReport {
    pub policy: ComparisonPolicy,
    /// The head revision of the migration scripts.
    pub latest_revision: String,
    /// The revision recorded in the database.
    pub db_version: String,
    pub alignment: Alignment,
}

impl AlignmentReport {
    pub fn is_success(&self) -> bool {
        self.alignment.is_success()
    }

    pub fn exit_code(&self) -> i32 {
        self.alignment.exit_code()
    }

    /// A human-readable verdict.
    pub fn message(&self) -> String {
        let latest = &self.latest_revision;
        let db = &self.db_version;
        match (self.policy, self.alignment) {
            (ComparisonPolicy::ExactMatch, Alignment::UpToDate) => {
                "SUCCESS: Version verification passed.\n\
                 The latest Alembic migration script's revision matches the current database version."
                    .to_string()
            }
            (ComparisonPolicy::ExactMatch, _) => {
                "ERROR: Version mismatch detected.\n\
                 The latest Alembic migration script's revision doesn't match the current database version.\n\
                 Action Required: Please review your migration scripts."
                    .to_string()
            }
            (ComparisonPolicy::ChainWalk, Alignment::UpToDate) => {
                "SUCCESS: The database version matches the latest migration script's revision ID.\n\
                 NOTICE: No new migrations have been detected.\n\
                 If a new migration was expected but not recognized, please check the migration script for issues."
                    .to_string()
            }
            (ComparisonPolicy::ChainWalk, Alignment::Pending(1)) => format!(
                "SUCCESS: The database is currently at version {db}, the down revision of the latest \
                 migration script ({latest}).\n\
                 One pending migration is ready to be applied to bring the database schema up to the latest version."
            ),
            (ComparisonPolicy::ChainWalk, Alignment::Pending(count)) => format!(
                "SUCCESS: The database is currently at version {db}, which belongs to a previously applied migration.\n\
                 There are {count} new migration scripts ready to be applied to bring the database schema up to \
                 the latest version ({latest}).\n\
                 Recommendation: Apply the {count} pending migrations in sequence, testing and taking a backup \
                 before each one so that any step can be rolled back."
            ),
            (ComparisonPolicy::ChainWalk, Alignment::Mismatch) => format!(
                "ERROR: Version mismatch detected.\n\
                 The current database version ({db}) is neither the latest revision ({latest}) nor one of its \
                 down revisions.\n\
                 Immediate Action Required: Review the migration history and scripts for accuracy before migrating."
            ),
        }
    }
}

/// Checks a database's Alembic revision against a migration script directory.
///
/// Construction validates every input without touching the database. [AlignmentChecker::check]
/// then reads the head revision, opens one connection to read the database revision, and
/// classifies the pair according to the [ComparisonPolicy].
pub struct AlignmentChecker {
    endpoint: Endpoint,
    script_location: ScriptLocation,
    policy: ComparisonPolicy,
    version_table_schema: Option<String>,
    script_directory: Option<ScriptDirectory>,
    on_progress: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

// Manual Debug impl since closures don't implement Debug
impl std::fmt::Debug for AlignmentChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentChecker")
            .field("endpoint", &self.endpoint)
            .field("script_location", &self.script_location)
            .field("policy", &self.policy)
            .field("version_table_schema", &self.version_table_schema)
            .field("script_directory_loaded", &self.script_directory.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl AlignmentChecker {
    /// Validate the inputs and build a checker.
    ///
    /// Settings given piece by piece are validated first (name, type, then credentials for
    /// non-SQLite databases). The migrations path must exist in every case, and so must
    /// `alembic.ini` when the scripts are located through it.
    pub fn new(
        target: DatabaseTarget,
        script_location: ScriptLocation,
        policy: ComparisonPolicy,
    ) -> Result<Self, Error> {
        let endpoint = target.resolve()?;
        script_location.validate()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            url = %endpoint.redacted_url(),
            script_location = ?script_location,
            policy = ?policy,
            "Alignment checker configured"
        );

        Ok(Self {
            endpoint,
            script_location,
            policy,
            version_table_schema: None,
            script_directory: None,
            on_progress: None,
        })
    }

    /// Read the version table from this schema instead of the connection's default one.
    pub fn with_version_table_schema(mut self, schema: Option<impl Into<String>>) -> Self {
        self.version_table_schema = schema.map(Into::into);
        self
    }

    /// Set a callback to be invoked with each progress message.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn policy(&self) -> ComparisonPolicy {
        self.policy
    }

    fn progress(&self, message: &str) {
        #[cfg(feature = "tracing")]
        tracing::info!("{}", message);
        if let Some(callback) = &self.on_progress {
            callback(message);
        }
    }

    /// The migration scripts, loaded on first use.
    pub fn script_directory(&mut self) -> Result<&ScriptDirectory, Error> {
        let script_directory = match self.script_directory.take() {
            Some(script_directory) => script_directory,
            None => self.script_location.load()?,
        };
        Ok(self.script_directory.insert(script_directory))
    }

    /// The identifier of the head revision.
    /// Returns [Error::NoHeadRevision] when the script directory holds no revisions.
    pub fn latest_revision(&mut self) -> Result<String, Error> {
        self.progress("Retrieving the latest migration version from the Alembic migrations directory...");
        let head = self
            .script_directory()?
            .head()?
            .map(|record| record.revision.clone());
        match head {
            Some(revision) => {
                self.progress("Latest migration version found.");
                Ok(revision)
            }
            None => Err(Error::NoHeadRevision),
        }
    }

    /// Connect to the database and read the revision it records.
    pub fn db_version(&self) -> Result<String, Error> {
        self.progress("Attempting to fetch the current database version...");
        let mut source = self.connect()?;
        let version = source.current_version()?;
        self.progress("Database version fetched successfully.");
        Ok(version)
    }

    fn connect(&self) -> Result<Box<dyn VersionSource>, Error> {
        let schema = self.version_table_schema.as_deref();
        match self.endpoint.kind() {
            #[cfg(feature = "sqlite")]
            DatabaseKind::Sqlite => Ok(Box::new(crate::sqlite::SqliteVersionSource::connect(
                &self.endpoint,
                schema,
            )?)),
            #[cfg(feature = "mysql")]
            DatabaseKind::Mysql => Ok(Box::new(crate::mysql::MysqlVersionSource::connect(
                &self.endpoint,
                schema,
            )?)),
            #[cfg(feature = "postgres")]
            DatabaseKind::Postgresql => Ok(Box::new(
                crate::postgres::PostgresVersionSource::connect(&self.endpoint, schema)?,
            )),
            #[allow(unreachable_patterns)]
            kind => Err(Error::Generic(format!(
                "Support for {} databases is not enabled in this build.",
                kind
            ))),
        }
    }

    /// Run the check against the configured database.
    pub fn check(&mut self) -> Result<AlignmentReport, Error> {
        let latest_revision = self.latest_revision()?;
        let db_version = self.db_version()?;
        self.classify(latest_revision, db_version)
    }

    /// Run the check, reading the database revision from `source` instead of connecting.
    pub fn check_with(&mut self, source: &mut dyn VersionSource) -> Result<AlignmentReport, Error> {
        let latest_revision = self.latest_revision()?;
        self.progress("Attempting to fetch the current database version...");
        let db_version = source.current_version()?;
        self.progress("Database version fetched successfully.");
        self.classify(latest_revision, db_version)
    }

    fn classify(
        &mut self,
        latest_revision: String,
        db_version: String,
    ) -> Result<AlignmentReport, Error> {
        let policy = self.policy;
        let alignment = evaluate_alignment(
            &latest_revision,
            &db_version,
            policy,
            self.script_directory()?,
        );

        #[cfg(feature = "tracing")]
        tracing::info!(
            latest_revision = %latest_revision,
            db_version = %db_version,
            alignment = ?alignment,
            "Alignment evaluated"
        );

        Ok(AlignmentReport {
            policy,
            latest_revision,
            db_version,
            alignment,
        })
    }
}
