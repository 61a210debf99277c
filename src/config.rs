use std::{
    env::{self, VarError},
    fmt,
};

use rearch::{CData, CapsuleHandle, Container};
use sea_orm::{ConnectOptions, Database, DbConn};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::orm;

const DEFAULT_ADDR: &str = "127.0.0.1:0";
const DEFAULT_DB_HOST: &str = "localhost";

/// Everything the server needs to know up front, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: String,
    pub database: DatabaseConfig,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: DbBackendKind,
    pub user: String,
    pub password: String,
    /// Host name, optionally with a `:port` suffix.
    pub host: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackendKind {
    MySql,
    Postgres,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is invalid unicode: {value}")]
    NotUnicode { name: &'static str, value: String },
    #[error("unknown database backend {0:?}; expected \"mysql\" or \"postgres\"")]
    UnknownBackend(String),
    #[error("database host {0:?} is invalid")]
    InvalidHost(String),
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Will return [`Err`] if a required variable is missing or any is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Reads the configuration through `lookup`, which behaves like [`env::var`].
    ///
    /// # Errors
    /// Will return [`Err`] if a required variable is missing or any is invalid.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &'static str| match lookup(name) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(actual)) => Err(ConfigError::NotUnicode {
                name,
                value: actual.display().to_string(),
            }),
        };
        let required = |name: &'static str| var(name)?.ok_or(ConfigError::Missing(name));

        let addr = var("ADDR")?.unwrap_or_else(|| {
            warn!(
                addr = DEFAULT_ADDR,
                "ADDR environment variable not set; defaulting to {DEFAULT_ADDR}"
            );
            DEFAULT_ADDR.to_owned()
        });

        let backend = match var("DB_BACKEND")?.as_deref() {
            None | Some("mysql") => DbBackendKind::MySql,
            Some("postgres" | "postgresql") => DbBackendKind::Postgres,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_owned())),
        };

        Ok(Self {
            addr,
            database: DatabaseConfig {
                backend,
                user: required("DB_USER")?,
                password: var("DB_PASSWORD")?.unwrap_or_default(),
                host: var("DB_HOST")?.unwrap_or_else(|| DEFAULT_DB_HOST.to_owned()),
                name: required("DB_NAME")?,
            },
        })
    }
}

impl DatabaseConfig {
    /// Assembles the connection URL, percent-encoding the credentials.
    ///
    /// # Errors
    /// Will return [`Err`] if the host cannot be part of a URL.
    pub fn connection_url(&self) -> Result<Url, ConfigError> {
        let scheme = match self.backend {
            DbBackendKind::MySql => "mysql",
            DbBackendKind::Postgres => "postgres",
        };
        let invalid_host = || ConfigError::InvalidHost(self.host.clone());

        let mut url =
            Url::parse(&format!("{scheme}://{}", self.host)).map_err(|_| invalid_host())?;
        if url.host_str().is_none_or(str::is_empty) || !url.path().is_empty() {
            return Err(invalid_host());
        }
        url.set_username(&self.user).map_err(|()| invalid_host())?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|()| invalid_host())?;
        }
        url.set_path(&format!("/{}", self.name));
        Ok(url)
    }

    /// # Errors
    /// Will return [`Err`] if the host cannot be part of a URL.
    pub fn connect_options(&self) -> Result<ConnectOptions, ConfigError> {
        Ok(ConnectOptions::new(self.connection_url()?.to_string()))
    }
}

// NOTE: hand-written so the password never ends up in logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("name", &self.name)
            .finish()
    }
}

/// # Errors
/// Will return [`Err`] if the connection to the database fails
/// or the paste table cannot be created.
#[instrument]
pub async fn init_container(config: &Config) -> anyhow::Result<Container> {
    info!("Initializing container");

    let connect_options = config.database.connect_options()?;
    info!(database = ?config.database, "Connecting to database");
    let db = Database::connect(connect_options).await?;
    orm::ensure_schema(&db).await?;

    let container = container_with_db_conn(db);
    info!("Container initialized");
    Ok(container)
}

/// Builds a [`Container`] around an already established [`DbConn`].
#[must_use]
pub fn container_with_db_conn(db: DbConn) -> Container {
    let container = Container::new();
    let set_db_conn = container.read(db_conn_init_action);
    set_db_conn(db);
    container
}

fn db_conn_manager(
    CapsuleHandle { register, .. }: CapsuleHandle,
) -> (Option<DbConn>, impl use<> + CData + Fn(Option<DbConn>)) {
    register.register(rearch_effects::state::<rearch_effects::Cloned<_>>(None))
}

pub fn db_conn_init_action(
    CapsuleHandle { mut get, .. }: CapsuleHandle,
) -> impl use<> + CData + Fn(DbConn) {
    let set_db_conn = get.as_ref(db_conn_manager).1.clone();
    move |db| set_db_conn(Some(db))
}

/// # Panics
/// Panics when the [`DbConn`] was not set via [`db_conn_init_action`].
pub fn db_conn_capsule(CapsuleHandle { mut get, .. }: CapsuleHandle) -> DbConn {
    let db_conn = get.as_ref(db_conn_manager).0.clone();
    db_conn.expect("DbConn should've been set via db_conn_init_action!")
}
