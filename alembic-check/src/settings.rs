//! Connection settings, their validation, and database URL construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::error::Error;

const INVALID_TYPE_MESSAGE: &str =
    "Invalid database type. Supported types are 'postgresql', 'mysql', and 'sqlite'.";

/// The database engines the checks can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgresql,
    Mysql,
    Sqlite,
}

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgresql => "postgresql",
            DatabaseKind::Mysql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
        }
    }

    /// Determine the engine from a URL scheme, ignoring any SQLAlchemy driver suffix
    /// (`postgresql+psycopg2://...`).
    pub fn from_url(url: &str) -> Result<Self, Error> {
        // the URL may hold a password, so only the parse error is reported
        let parsed = Url::parse(url)
            .map_err(|e| Error::Validation(format!("Invalid database URL: {}.", e)))?;
        match dialect(&parsed) {
            "postgresql" | "postgres" => Ok(DatabaseKind::Postgresql),
            "mysql" | "mariadb" => Ok(DatabaseKind::Mysql),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            _ => Err(Error::Validation(INVALID_TYPE_MESSAGE.to_string())),
        }
    }
}

/// The URL scheme without its driver suffix.
fn dialect(url: &Url) -> &str {
    let scheme = url.scheme();
    scheme.split('+').next().unwrap_or(scheme)
}

impl FromStr for DatabaseKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "postgresql" => Ok(DatabaseKind::Postgresql),
            "mysql" => Ok(DatabaseKind::Mysql),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            _ => Err(Error::Validation(INVALID_TYPE_MESSAGE.to_string())),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details given piece by piece.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub db_type: String,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact_password(&self.password))
            .field("name", &self.name)
            .finish()
    }
}

impl ConnectionSettings {
    /// Check that the settings are complete enough to connect with.
    ///
    /// The database name is always required and the type must be supported. Host, port, user,
    /// and password are only required when the database isn't SQLite.
    pub fn validate(&self) -> Result<DatabaseKind, Error> {
        if self.name.is_empty() {
            return Err(Error::Validation("Database name is required.".to_string()));
        }

        let kind = self.db_type.parse::<DatabaseKind>()?;

        if kind != DatabaseKind::Sqlite
            && (self.host.is_empty()
                || self.port.is_empty()
                || self.user.is_empty()
                || self.password.is_empty())
        {
            return Err(Error::Validation(
                "Database host, port, user, and password are required for non-SQLite databases."
                    .to_string(),
            ));
        }

        Ok(kind)
    }

    /// The URL these settings describe.
    pub fn database_url(&self, kind: DatabaseKind) -> String {
        match kind {
            DatabaseKind::Sqlite => format!("sqlite:///{}", self.name),
            _ => format!(
                "{}://{}:{}@{}:{}/{}",
                kind, self.user, self.password, self.host, self.port, self.name
            ),
        }
    }

    /// The port as a number, for drivers that connect from the pieces.
    pub fn port_number(&self) -> Result<u16, Error> {
        self.port
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid database port '{}'.", self.port)))
    }
}

/// The database to check, either as a full URL or as separate settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// A URL overriding every other connection setting.
    Url(String),
    Settings(ConnectionSettings),
}

impl DatabaseTarget {
    /// Validate the target, producing the endpoint to connect to.
    pub fn resolve(self) -> Result<Endpoint, Error> {
        match self {
            DatabaseTarget::Url(url) => Ok(Endpoint {
                kind: DatabaseKind::from_url(&url)?,
                url,
                settings: None,
            }),
            DatabaseTarget::Settings(settings) => {
                let kind = settings.validate()?;
                Ok(Endpoint {
                    kind,
                    url: settings.database_url(kind),
                    settings: Some(settings),
                })
            }
        }
    }
}

/// A validated database location.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    kind: DatabaseKind,
    url: String,
    settings: Option<ConnectionSettings>,
}

// Manual Debug impl so the password never ends up in logs
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("kind", &self.kind)
            .field("url", &self.redacted_url())
            .finish()
    }
}

impl Endpoint {
    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    /// The full URL, including the password.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any password replaced by `***`.
    pub fn redacted_url(&self) -> String {
        match &self.settings {
            Some(settings) if self.kind != DatabaseKind::Sqlite => ConnectionSettings {
                password: REDACTED.to_string(),
                ..settings.clone()
            }
            .database_url(self.kind),
            _ => redact_url(&self.url),
        }
    }

    /// The individual settings, when the endpoint wasn't given as a URL.
    pub fn settings(&self) -> Option<&ConnectionSettings> {
        self.settings.as_ref()
    }

    /// The URL in the form the drivers accept: any SQLAlchemy driver suffix is dropped from the
    /// scheme and `mariadb` becomes `mysql`.
    pub fn driver_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return self.url.clone();
        };
        let scheme = match dialect(&url) {
            "mariadb" => "mysql",
            dialect => dialect,
        }
        .to_string();
        if scheme != url.scheme() && url.set_scheme(&scheme).is_err() {
            return self.url.clone();
        }
        url.to_string()
    }

    /// The SQLite database file, or `None` for an in-memory database.
    ///
    /// `sqlite:///relative.db` names a relative path, `sqlite:////abs/path.db` an absolute one.
    pub fn sqlite_path(&self) -> Option<PathBuf> {
        if let Some(settings) = &self.settings {
            return Some(PathBuf::from(&settings.name));
        }
        let url = Url::parse(&self.url).ok()?;
        let path = url.path();
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = urlencoding::decode(path)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| path.to_string());
        if path.is_empty() || path == ":memory:" {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

const REDACTED: &str = "***";

fn redact_password(password: &str) -> &'static str {
    if password.is_empty() {
        ""
    } else {
        REDACTED
    }
}

/// Replace the password in a database URL with `***`.
///
/// A URL that doesn't parse is returned unchanged.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some(REDACTED)).is_err() {
                return url.to_string();
            }
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Check that the migrations path exists on disk.
pub fn validate_migrations_path(path: &Path) -> Result<(), Error> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Migrations path '{}' does not exist.",
            path.display()
        )))
    }
}
