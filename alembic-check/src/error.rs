use std::path::PathBuf;

/// Error type for the alembic-check crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Rusqlite(rusqlite::Error),
    #[cfg(feature = "mysql")]
    #[error("{0}")]
    Mysql(String),
    #[cfg(feature = "postgres")]
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    /// Bad or missing connection settings, raised before any connection is attempted.
    #[error("{0}")]
    Validation(String),
    #[error("Failed to read Alembic configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("Failed to read migration script {}: {message}", .path.display())]
    Script { path: PathBuf, message: String },
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No head revision found in Alembic migrations.")]
    NoHeadRevision,
    #[error("Multiple head revisions found ({}); branched migration histories are not supported.", .0.join(", "))]
    MultipleHeads(Vec<String>),
    #[error("Revision {0} merges several down revisions; branched migration histories are not supported.")]
    BranchedRevision(String),
    #[error("Revision {0} is present more than once in the migration scripts.")]
    DuplicateRevision(String),
    #[error("Alembic version table not found.")]
    VersionTableNotFound,
    #[error("Alembic version table is empty.")]
    EmptyVersionTable,
    #[error("{0}")]
    Generic(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Rusqlite(value)
    }
}

#[cfg(feature = "mysql")]
impl From<mysql::Error> for Error {
    fn from(value: mysql::Error) -> Self {
        Self::Mysql(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

// Manual PartialEq implementation because postgres::Error and io::Error don't implement PartialEq
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            #[cfg(feature = "sqlite")]
            (Self::Rusqlite(a), Self::Rusqlite(b)) => a == b,
            #[cfg(feature = "mysql")]
            (Self::Mysql(a), Self::Mysql(b)) => a == b,
            #[cfg(feature = "postgres")]
            (Self::Postgres(a), Self::Postgres(b)) => a.to_string() == b.to_string(),
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (
                Self::Config {
                    path: a,
                    message: m,
                },
                Self::Config {
                    path: b,
                    message: n,
                },
            ) => a == b && m == n,
            (
                Self::Script {
                    path: a,
                    message: m,
                },
                Self::Script {
                    path: b,
                    message: n,
                },
            ) => a == b && m == n,
            (Self::Io { path: a, source: s }, Self::Io { path: b, source: t }) => {
                a == b && s.kind() == t.kind()
            }
            (Self::NoHeadRevision, Self::NoHeadRevision) => true,
            (Self::MultipleHeads(a), Self::MultipleHeads(b)) => a == b,
            (Self::BranchedRevision(a), Self::BranchedRevision(b)) => a == b,
            (Self::DuplicateRevision(a), Self::DuplicateRevision(b)) => a == b,
            (Self::VersionTableNotFound, Self::VersionTableNotFound) => true,
            (Self::EmptyVersionTable, Self::EmptyVersionTable) => true,
            (Self::Generic(a), Self::Generic(b)) => a == b,
            _ => false,
        }
    }
}
