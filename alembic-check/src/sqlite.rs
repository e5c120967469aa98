//! # SQLite support
//!
//! Reads the Alembic version table using the [`rusqlite`](https://crates.io/crates/rusqlite) crate.
//! Database files are opened read-only, so checking a path that doesn't exist fails instead of
//! creating an empty database. A configured schema names an attached database.

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::core::{qualifying_schema, VersionSource, ALEMBIC_VERSION_TABLE, VERSION_COLUMN};
use crate::error::Error;
use crate::settings::Endpoint;

/// Reads the current revision from a SQLite database.
#[derive(Debug)]
pub struct SqliteVersionSource {
    conn: Connection,
    schema: Option<String>,
}

impl SqliteVersionSource {
    /// Open the database the endpoint names.
    pub fn connect(endpoint: &Endpoint, schema: Option<&str>) -> Result<Self, Error> {
        let conn = match endpoint.sqlite_path() {
            Some(path) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(path = %path.display(), "Opening SQLite database");
                Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?
            }
            None => Connection::open_in_memory()?,
        };
        Ok(Self::from_connection(conn, schema))
    }

    /// Use an already open connection.
    pub fn from_connection(conn: Connection, schema: Option<&str>) -> Self {
        Self {
            conn,
            schema: qualifying_schema(schema).map(str::to_string),
        }
    }
}

impl VersionSource for SqliteVersionSource {
    fn current_version(&mut self) -> Result<String, Error> {
        read_version(&self.conn, self.schema.as_deref())
    }
}

/// Read `version_num` from the `alembic_version` table.
pub fn read_version(conn: &Connection, schema: Option<&str>) -> Result<String, Error> {
    let schema = qualifying_schema(schema);
    let master = match schema {
        Some(schema) => format!("{}.sqlite_master", quote_identifier(schema)),
        None => "sqlite_master".to_string(),
    };

    let table_exists: bool = conn.query_row(
        &format!(
            "SELECT COUNT(*) > 0 FROM {} WHERE type = 'table' AND name = ?1",
            master
        ),
        [ALEMBIC_VERSION_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(Error::VersionTableNotFound);
    }

    let table = match schema {
        Some(schema) => format!(
            "{}.{}",
            quote_identifier(schema),
            quote_identifier(ALEMBIC_VERSION_TABLE)
        ),
        None => quote_identifier(ALEMBIC_VERSION_TABLE),
    };
    // a NULL version_num counts as no version
    let version: Option<String> = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} LIMIT 1",
                quote_identifier(VERSION_COLUMN),
                table
            ),
            [],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .flatten();

    version.ok_or(Error::EmptyVersionTable)
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
