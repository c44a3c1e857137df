//! Typed CRUD passthroughs for PostgreSQL-backed repositories.
//!
//! Writes are built with SeaQuery. Methods taking a `predicate` accept the
//! same `?` placeholder convention as compiled finders, e.g.
//! `repo.select(&ctx, "status = ? AND total > ?", &args!["open", 100])`.
//! An empty predicate matches every row.

use super::Repository;
use crate::context::QueryContext;
use crate::entity::{Entity, FromRow};
use crate::executor::{LifeError, LifeExecutor};
use crate::query::binder::Arg;
use crate::query::compiler::quote_identifier;
use crate::query::error::CallError;
use crate::store::statement::{render_placeholders, Statement};
use crate::store::PostgresStore;
use sea_query::{Asterisk, Expr, ExprTrait, Iden, PostgresQueryBuilder, Query, Value};
use serde::{Deserialize, Serialize};

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        let total = u64::try_from(self.total_count).unwrap_or(0);
        total.div_ceil(self.page_size)
    }
}

/// Table or column name known at compile time
struct Name(&'static str);

impl Iden for Name {
    fn unquoted(&self) -> &str {
        self.0
    }
}

impl<E, X> Repository<E, PostgresStore<X>>
where
    E: Entity + FromRow,
    X: LifeExecutor + Send + Sync,
{
    /// Insert `entity` and return the stored row, including generated columns
    pub fn insert(&self, ctx: &QueryContext, entity: &E) -> Result<E, CallError> {
        let (columns, values): (Vec<_>, Vec<_>) = entity
            .values()
            .into_iter()
            .map(|(column, value)| (Name(column), Expr::val(value)))
            .unzip();
        if columns.is_empty() {
            return Err(LifeError::Other("No fields to insert".to_string()).into());
        }

        let mut query = Query::insert();
        query.into_table(Name(E::TABLE_NAME)).columns(columns);
        query
            .values(values)
            .map_err(|e| LifeError::QueryError(format!("Failed to build insert: {e}")))?;
        query.returning_col(Asterisk);

        let (sql, values) = query.build(PostgresQueryBuilder);
        self.first(ctx, &sql, &values.0)
    }

    /// Overwrite the row with `entity`'s primary key.
    ///
    /// # Errors
    ///
    /// [`CallError::NotFound`] when no row has that key.
    pub fn update(&self, ctx: &QueryContext, entity: &E) -> Result<E, CallError> {
        let id: Value = entity.primary_key().into();
        let mut query = Query::update();
        query.table(Name(E::TABLE_NAME));
        for (column, value) in entity.values() {
            if column != E::PRIMARY_KEY {
                query.value(Name(column), Expr::val(value));
            }
        }
        query
            .and_where(Expr::col(Name(E::PRIMARY_KEY)).eq(id))
            .returning_col(Asterisk);

        let (sql, values) = query.build(PostgresQueryBuilder);
        self.first(ctx, &sql, &values.0)
    }

    /// Delete by primary key, returning the number of rows removed
    pub fn delete_by_id(&self, ctx: &QueryContext, id: E::Id) -> Result<u64, CallError> {
        let id: Value = id.into();
        let (sql, values) = Query::delete()
            .from_table(Name(E::TABLE_NAME))
            .and_where(Expr::col(Name(E::PRIMARY_KEY)).eq(id))
            .build(PostgresQueryBuilder);
        self.store().execute(ctx, &sql, &values.0)
    }

    pub fn find_by_id(&self, ctx: &QueryContext, id: E::Id) -> Result<E, CallError> {
        let id: Value = id.into();
        let (sql, values) = Query::select()
            .column(Asterisk)
            .from(Name(E::TABLE_NAME))
            .and_where(Expr::col(Name(E::PRIMARY_KEY)).eq(id))
            .limit(1)
            .build(PostgresQueryBuilder);
        self.first(ctx, &sql, &values.0)
    }

    /// Every row, ordered by primary key
    pub fn list_all(&self, ctx: &QueryContext) -> Result<Vec<E>, CallError> {
        self.select(ctx, "", &[])
    }

    pub fn count(&self, ctx: &QueryContext) -> Result<i64, CallError> {
        self.count_by(ctx, "", &[])
    }

    pub fn count_by(
        &self,
        ctx: &QueryContext,
        predicate: &str,
        args: &[Arg],
    ) -> Result<i64, CallError> {
        let statement = filtered(
            format!("SELECT COUNT(*) FROM {}", quote_identifier(E::TABLE_NAME)),
            predicate,
            args,
        )?;
        self.store()
            .query_scalar(ctx, &statement.sql, &statement.values)
    }

    pub fn exists(
        &self,
        ctx: &QueryContext,
        predicate: &str,
        args: &[Arg],
    ) -> Result<bool, CallError> {
        let inner = filtered(
            format!("SELECT 1 FROM {}", quote_identifier(E::TABLE_NAME)),
            predicate,
            args,
        )?;
        self.store().query_scalar(
            ctx,
            &format!("SELECT EXISTS({})", inner.sql),
            &inner.values,
        )
    }

    /// Rows matching `predicate`, ordered by primary key
    pub fn select(
        &self,
        ctx: &QueryContext,
        predicate: &str,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError> {
        let mut statement = filtered(
            format!("SELECT * FROM {}", quote_identifier(E::TABLE_NAME)),
            predicate,
            args,
        )?;
        statement.sql.push_str(&format!(
            " ORDER BY {} ASC",
            quote_identifier(E::PRIMARY_KEY)
        ));
        self.store().fetch(ctx, &statement.sql, &statement.values)
    }

    /// First row matching `predicate` by primary key
    pub fn select_one(
        &self,
        ctx: &QueryContext,
        predicate: &str,
        args: &[Arg],
    ) -> Result<E, CallError> {
        let mut statement = filtered(
            format!("SELECT * FROM {}", quote_identifier(E::TABLE_NAME)),
            predicate,
            args,
        )?;
        statement.sql.push_str(&format!(
            " ORDER BY {} ASC LIMIT 1",
            quote_identifier(E::PRIMARY_KEY)
        ));
        self.first(ctx, &statement.sql, &statement.values)
    }

    /// Run a full statement with `?` placeholders and map its rows to `E`
    pub fn raw_query(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError> {
        let (sql, values) = render_placeholders(sql, args, 1)?;
        self.store().fetch(ctx, &sql, &values)
    }

    /// One page of rows matching `predicate`, ordered by primary key.
    ///
    /// `page` is 1-based; `0` is treated as the first page.
    pub fn paginate(
        &self,
        ctx: &QueryContext,
        page: u64,
        page_size: u64,
        predicate: &str,
        args: &[Arg],
    ) -> Result<Page<E>, CallError> {
        if page_size == 0 {
            return Err(LifeError::QueryError("page size must be positive".to_string()).into());
        }
        let page = page.max(1);
        let total_count = self.count_by(ctx, predicate, args)?;

        let mut statement = filtered(
            format!("SELECT * FROM {}", quote_identifier(E::TABLE_NAME)),
            predicate,
            args,
        )?;
        statement.sql.push_str(&format!(
            " ORDER BY {} ASC LIMIT {page_size} OFFSET {}",
            quote_identifier(E::PRIMARY_KEY),
            (page - 1).saturating_mul(page_size)
        ));
        let items = self.store().fetch(ctx, &statement.sql, &statement.values)?;

        Ok(Page {
            items,
            total_count,
            page,
            page_size,
        })
    }

    fn first(&self, ctx: &QueryContext, sql: &str, values: &[Value]) -> Result<E, CallError> {
        self.store()
            .fetch(ctx, sql, values)?
            .into_iter()
            .next()
            .ok_or(CallError::NotFound)
    }
}

/// Append `WHERE <predicate>` with renumbered placeholders
fn filtered(base: String, predicate: &str, args: &[Arg]) -> Result<Statement, CallError> {
    let predicate = predicate.trim();
    if predicate.is_empty() {
        if !args.is_empty() {
            return Err(CallError::Arity {
                expected: 0,
                actual: args.len(),
            });
        }
        return Ok(Statement::new(base, Vec::new()));
    }
    let (predicate, values) = render_placeholders(predicate, args, 1)?;
    Ok(Statement::new(format!("{base} WHERE {predicate}"), values))
}
