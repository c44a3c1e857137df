//! Helpers for tests that need a live PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` to run them; without it [`TestDatabase::connect`]
//! returns `None` and the test should return early.

use crate::config::DatabaseConfig;
use crate::context::QueryContext;
use crate::executor::{LifeError, LifeExecutor};
use crate::store::PostgresStore;

pub const DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";

pub struct TestDatabase {
    pub config: DatabaseConfig,
    pub store: PostgresStore,
}

impl TestDatabase {
    /// Connect to `TEST_DATABASE_URL`, or `None` when it is unset
    ///
    /// # Panics
    ///
    /// When the variable is set but the database cannot be reached.
    pub fn connect() -> Option<Self> {
        let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
            log::warn!("{DATABASE_URL_VAR} is not set, skipping database test");
            return None;
        };
        let config = DatabaseConfig {
            url: Some(url),
            debug: true,
            ..Default::default()
        };
        let store = match PostgresStore::open(&config) {
            Ok(store) => store,
            Err(e) => panic!("cannot connect to {DATABASE_URL_VAR}: {e}"),
        };
        Some(Self { config, store })
    }

    /// Run `CREATE TEMP TABLE IF NOT EXISTS <name> <schema>`
    pub fn create_temp_table(&self, name: &str, schema: &str) -> Result<(), LifeError> {
        let sql = format!("CREATE TEMP TABLE IF NOT EXISTS {name} {schema}");
        self.store.executor().execute(&sql, &[])?;
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> Result<(), LifeError> {
        let sql = format!("DROP TABLE IF EXISTS {name}");
        self.store.executor().execute(&sql, &[])?;
        Ok(())
    }

    pub fn context(&self) -> QueryContext {
        QueryContext::background()
    }
}
