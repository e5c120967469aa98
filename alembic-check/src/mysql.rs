//! # MySQL support
//!
//! Reads the Alembic version table using the [`mysql`](https://crates.io/crates/mysql) crate.
//! Without a configured schema the table is looked up in the connection's current database.

use mysql::prelude::*;
use mysql::{Conn, Opts, OptsBuilder, Row};

use crate::core::{qualifying_schema, VersionSource, ALEMBIC_VERSION_TABLE, VERSION_COLUMN};
use crate::error::Error;
use crate::settings::Endpoint;

/// Reads the current revision from a MySQL database.
pub struct MysqlVersionSource {
    conn: Conn,
    schema: Option<String>,
}

impl std::fmt::Debug for MysqlVersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlVersionSource")
            .field("connection_id", &self.conn.connection_id())
            .field("schema", &self.schema)
            .finish()
    }
}

impl MysqlVersionSource {
    /// Connect to the database the endpoint names.
    ///
    /// Endpoints built from separate settings connect through [OptsBuilder], so passwords
    /// containing URL-reserved characters don't need escaping.
    pub fn connect(endpoint: &Endpoint, schema: Option<&str>) -> Result<Self, Error> {
        let opts: Opts = match endpoint.settings() {
            Some(settings) => OptsBuilder::new()
                .ip_or_hostname(Some(settings.host.clone()))
                .tcp_port(settings.port_number()?)
                .user(Some(settings.user.clone()))
                .pass(Some(settings.password.clone()))
                .db_name(Some(settings.name.clone()))
                .into(),
            None => Opts::from_url(&endpoint.driver_url())
                .map_err(|e| Error::Mysql(e.to_string()))?,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %endpoint.redacted_url(), "Connecting to MySQL");

        let conn = Conn::new(opts)?;
        Ok(Self::from_connection(conn, schema))
    }

    /// Use an already open connection.
    pub fn from_connection(conn: Conn, schema: Option<&str>) -> Self {
        Self {
            conn,
            schema: qualifying_schema(schema).map(str::to_string),
        }
    }
}

impl VersionSource for MysqlVersionSource {
    fn current_version(&mut self) -> Result<String, Error> {
        read_version(&mut self.conn, self.schema.as_deref())
    }
}

/// Read `version_num` from the `alembic_version` table.
pub fn read_version(conn: &mut Conn, schema: Option<&str>) -> Result<String, Error> {
    let schema = qualifying_schema(schema);

    let table_exists: bool = conn
        .exec_first(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = COALESCE(?, DATABASE()) AND table_name = ?",
            (schema, ALEMBIC_VERSION_TABLE),
        )?
        .map(|count: i64| count > 0)
        .unwrap_or(false);
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
    let row: Option<Row> = conn.query_first(format!(
        "SELECT {} FROM {} LIMIT 1",
        quote_identifier(VERSION_COLUMN),
        table
    ))?;

    // a NULL version_num counts as no version
    let version = match row.and_then(|row| row.get_opt::<Option<String>, usize>(0)) {
        Some(value) => value.map_err(|e| Error::Mysql(e.to_string()))?,
        None => None,
    };
    version.ok_or(Error::EmptyVersionTable)
}

fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}
