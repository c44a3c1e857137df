//! PostgreSQL entity store.

use crate::config::DatabaseConfig;
use crate::connection::{self, ConnectionError};
use crate::context::QueryContext;
use crate::entity::{Entity, FromRow};
use crate::executor::{LifeError, LifeExecutor, MayPostgresExecutor};
use crate::query::binder::Arg;
use crate::query::compiler::CompiledQuery;
use crate::query::error::CallError;
use crate::query::value_conversion::with_converted_params;
use crate::raw_sql;
use crate::store::statement::Statement;
use crate::store::EntityStore;
use may_postgres::types::FromSql;
use may_postgres::Row;
use sea_query::Value;

/// Runs compiled finders and CRUD statements on a [`LifeExecutor`].
///
/// The context is checked right before a statement is sent. A statement
/// already running on the server is not interrupted.
pub struct PostgresStore<X = MayPostgresExecutor> {
    executor: X,
    debug: bool,
}

impl PostgresStore<MayPostgresExecutor> {
    /// Connect with `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` for an unsupported driver, a malformed
    /// connection string, or a failed connection.
    ///
    /// ```no_run
    /// use lifequery::{DatabaseConfig, PostgresStore};
    ///
    /// let config = DatabaseConfig::load()?;
    /// let store = PostgresStore::open(&config)?;
    /// assert!(store.executor().check_health()?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        let executor = connection::open(config)?;
        Ok(Self::new(executor).with_debug(config.debug))
    }
}

impl<X: LifeExecutor> PostgresStore<X> {
    pub fn new(executor: X) -> Self {
        Self {
            executor,
            debug: false,
        }
    }

    /// Log every statement at debug level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Run a query and return its raw rows
    pub fn query_rows(
        &self,
        ctx: &QueryContext,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<Row>, CallError> {
        ctx.check()?;
        self.trace(sql, values);
        let rows = with_converted_params(values, |params| {
            raw_sql::find_all_by_statement(&self.executor, sql, params)
        })?;
        Ok(rows)
    }

    /// Run a statement and return the number of rows affected
    pub fn execute(
        &self,
        ctx: &QueryContext,
        sql: &str,
        values: &[Value],
    ) -> Result<u64, CallError> {
        ctx.check()?;
        self.trace(sql, values);
        let affected = with_converted_params(values, |params| {
            raw_sql::execute_statement(&self.executor, sql, params)
        })?;
        Ok(affected)
    }

    /// Run a query returning one row and read its first column
    pub fn query_scalar<T>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        values: &[Value],
    ) -> Result<T, CallError>
    where
        T: for<'a> FromSql<'a>,
    {
        ctx.check()?;
        self.trace(sql, values);
        let value = with_converted_params(values, |params| {
            raw_sql::query_value(&self.executor, sql, params)
        })?;
        Ok(value)
    }

    /// Run a query and map every row to `E`
    pub fn fetch<E: FromRow>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        values: &[Value],
    ) -> Result<Vec<E>, CallError> {
        self.query_rows(ctx, sql, values)?
            .iter()
            .map(|row| {
                E::from_row(row).map_err(|e| {
                    CallError::Execution(LifeError::ParseError(format!(
                        "Failed to parse row: {e}"
                    )))
                })
            })
            .collect()
    }

    fn trace(&self, sql: &str, values: &[Value]) {
        if self.debug {
            log::debug!("{sql} -- {values:?}");
        }
    }
}

impl<E, X> EntityStore<E> for PostgresStore<X>
where
    E: Entity + FromRow,
    X: LifeExecutor + Send + Sync,
{
    fn execute_single(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<E, CallError> {
        let statement = Statement::finder(&E::descriptor(), query, args)?;
        self.fetch(ctx, &statement.sql, &statement.values)?
            .into_iter()
            .next()
            .ok_or(CallError::NotFound)
    }

    fn execute_many(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError> {
        let statement = Statement::finder(&E::descriptor(), query, args)?;
        self.fetch(ctx, &statement.sql, &statement.values)
    }
}
