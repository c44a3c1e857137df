//! Entity stores: where compiled finders are executed.
//!
//! The query core only depends on [`EntityStore`]. [`PostgresStore`] is the
//! production implementation; tests use in-process stores.

pub mod postgres;
pub mod statement;

pub use postgres::PostgresStore;
pub use statement::{render_placeholders, Statement};

use crate::context::QueryContext;
use crate::query::binder::Arg;
use crate::query::compiler::CompiledQuery;
use crate::query::error::CallError;
use std::sync::Arc;

/// Predicate-based execution against a backing store.
///
/// Implementations must honour the context's cancellation and deadline, and
/// report a singular miss as [`CallError::NotFound`]. A plural miss is an
/// empty `Vec`, never an error.
pub trait EntityStore<E>: Send + Sync {
    /// First row matching `query`
    fn execute_single(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<E, CallError>;

    /// Every row matching `query`, honouring its ordering and limit
    fn execute_many(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError>;
}

impl<E, S: EntityStore<E> + ?Sized> EntityStore<E> for Arc<S> {
    fn execute_single(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<E, CallError> {
        (**self).execute_single(ctx, query, args)
    }

    fn execute_many(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError> {
        (**self).execute_many(ctx, query, args)
    }
}
