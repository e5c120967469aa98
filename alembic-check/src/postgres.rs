//! # PostgreSQL support
//!
//! Reads the Alembic version table using the [`postgres`](https://crates.io/crates/postgres) crate.
//!
//! Without a configured schema the table is looked up in `current_schema()`, which is what a
//! migration run without `version_table_schema` writes to. The schema name `public` is treated
//! the same way.
//!
//! Connections are made without TLS.

use postgres::{Client, NoTls};

use crate::core::{qualifying_schema, VersionSource, ALEMBIC_VERSION_TABLE, VERSION_COLUMN};
use crate::error::Error;
use crate::settings::Endpoint;

/// Reads the current revision from a PostgreSQL database.
pub struct PostgresVersionSource {
    client: Client,
    schema: Option<String>,
}

impl std::fmt::Debug for PostgresVersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresVersionSource")
            .field("closed", &self.client.is_closed())
            .field("schema", &self.schema)
            .finish()
    }
}

impl PostgresVersionSource {
    /// Connect to the database the endpoint names.
    ///
    /// Endpoints built from separate settings connect through [postgres::Config], so passwords
    /// containing URL-reserved characters don't need escaping.
    pub fn connect(endpoint: &Endpoint, schema: Option<&str>) -> Result<Self, Error> {
        #[cfg(feature = "tracing")]
        tracing::debug!(url = %endpoint.redacted_url(), "Connecting to PostgreSQL");

        let client = match endpoint.settings() {
            Some(settings) => postgres::Config::new()
                .host(&settings.host)
                .port(settings.port_number()?)
                .user(&settings.user)
                .password(&settings.password)
                .dbname(&settings.name)
                .connect(NoTls)?,
            None => Client::connect(&endpoint.driver_url(), NoTls)?,
        };
        Ok(Self::from_client(client, schema))
    }

    /// Use an already connected client.
    pub fn from_client(client: Client, schema: Option<&str>) -> Self {
        Self {
            client,
            schema: qualifying_schema(schema).map(str::to_string),
        }
    }
}

impl VersionSource for PostgresVersionSource {
    fn current_version(&mut self) -> Result<String, Error> {
        read_version(&mut self.client, self.schema.as_deref())
    }
}

/// Read `version_num` from the `alembic_version` table.
pub fn read_version(client: &mut Client, schema: Option<&str>) -> Result<String, Error> {
    let schema = qualifying_schema(schema);

    let table_exists: bool = client
        .query_one(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = COALESCE($1::text, current_schema()) AND table_name = $2::text)",
            &[&schema, &ALEMBIC_VERSION_TABLE],
        )?
        .get(0);
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
    let row = client.query_opt(
        &format!(
            "SELECT {} FROM {} LIMIT 1",
            quote_identifier(VERSION_COLUMN),
            table
        ),
        &[],
    )?;

    // a NULL version_num counts as no version
    let version: Option<String> = match row {
        Some(row) => row.try_get(0)?,
        None => None,
    };
    version.ok_or(Error::EmptyVersionTable)
}

fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
