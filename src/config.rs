//! Database configuration.
//!
//! [`DatabaseConfig`] is a plain immutable value. Load it once with
//! [`DatabaseConfig::load`] (or build it by hand) and pass it to
//! [`PostgresStore::open`](crate::store::PostgresStore::open); nothing in the
//! crate reads configuration from global state.
//!
//! ```toml
//! # config/config.toml
//! [database]
//! host = "db.internal"
//! dbname = "orders"
//! schema = "billing"
//! debug = true
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `LIFEQUERY__DATABASE__PASSWORD=secret`.

use crate::connection::ConnectionError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "LIFEQUERY";

/// The only driver this crate can open
pub const POSTGRES_DRIVER: &str = "postgres";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when set it wins over the individual fields
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_dbname")]
    pub dbname: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    /// Log every executed statement at debug level
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_driver")]
    pub driver: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_dbname() -> String {
    "postgres".to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_driver() -> String {
    POSTGRES_DRIVER.to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            dbname: default_dbname(),
            schema: default_schema(),
            sslmode: default_sslmode(),
            debug: false,
            driver: default_driver(),
        }
    }
}

impl DatabaseConfig {
    /// Load the `[database]` section from `config/config.toml` and `LIFEQUERY__DATABASE__*`.
    ///
    /// The file is optional. When it exists but cannot be read, a warning is
    /// logged and the environment alone is used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when neither source yields a valid section.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        Self::from_config(&settings)
    }

    /// Read the `database` section of an already built [`Config`]; a missing
    /// section yields the defaults
    pub fn from_config(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }

    /// Connection string handed to the driver.
    ///
    /// `url` when set, otherwise a key-value DSN. The schema is not part of the
    /// DSN; the store sets `search_path` after connecting.
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let mut dsn = format!(
            "host={} port={} user={} dbname={} sslmode={}",
            self.host, self.port, self.user, self.dbname, self.sslmode
        );
        if !self.password.is_empty() {
            dsn.push_str(&format!(" password={}", self.password));
        }
        dsn
    }

    /// # Errors
    ///
    /// [`ConnectionError::UnsupportedDriver`] for anything but `postgres`.
    pub fn ensure_supported_driver(&self) -> Result<(), ConnectionError> {
        if self.driver == POSTGRES_DRIVER {
            Ok(())
        } else {
            Err(ConnectionError::UnsupportedDriver(self.driver.clone()))
        }
    }
}
