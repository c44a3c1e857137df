//! Dynamic method binder.
//!
//! [`bind`] turns a compiled finder into an [`Invocable`]: a shareable closure
//! that checks its arguments against the placeholders and hands the call to
//! the entity store. Invocables hold no per-call state, so one instance can
//! serve any number of concurrent callers.

use crate::context::QueryContext;
use crate::query::compiler::CompiledQuery;
use crate::query::error::CallError;
use crate::query::plan::{Multiplicity, ValueKind};
use crate::query::signature::Signature;
use crate::store::EntityStore;
use sea_query::Value;
use std::fmt;
use std::sync::Arc;

/// One positional finder argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    /// Bound to an `IN (?)` placeholder
    List(Vec<Value>),
}

impl Arg {
    pub fn kind(&self) -> ValueKind {
        match self {
            Arg::Value(_) => ValueKind::Scalar,
            Arg::List(_) => ValueKind::Sequence,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

/// Conversion of Rust values into finder arguments.
///
/// `KIND` is what the `repository!` macro uses to describe a parameter before
/// any value exists.
pub trait IntoArg {
    const KIND: ValueKind;

    fn into_arg(self) -> Arg;
}

macro_rules! scalar_args {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArg for $ty {
                const KIND: ValueKind = ValueKind::Scalar;

                fn into_arg(self) -> Arg {
                    Arg::Value(self.into())
                }
            }
        )*
    };
}

scalar_args!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    &str,
    Value,
    serde_json::Value,
    uuid::Uuid,
    rust_decimal::Decimal,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
);

impl<T> IntoArg for Option<T>
where
    Option<T>: Into<Value>,
{
    const KIND: ValueKind = ValueKind::Scalar;

    fn into_arg(self) -> Arg {
        Arg::Value(self.into())
    }
}

impl<T: Into<Value>> IntoArg for Vec<T> {
    const KIND: ValueKind = ValueKind::Sequence;

    fn into_arg(self) -> Arg {
        Arg::List(self.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> IntoArg for &[T] {
    const KIND: ValueKind = ValueKind::Sequence;

    fn into_arg(self) -> Arg {
        Arg::List(self.iter().cloned().map(Into::into).collect())
    }
}

/// Build an argument list from heterogeneous values.
///
/// ```
/// use lifequery::args;
/// use lifequery::query::binder::Arg;
///
/// let args = args!["active", vec![1_i64, 2, 3]];
/// assert!(matches!(args[1], Arg::List(_)));
/// ```
#[macro_export]
macro_rules! args {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::query::binder::IntoArg::into_arg($value)),*]
    };
}

/// Result of a finder call, shaped by its multiplicity
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput<E> {
    One(E),
    Many(Vec<E>),
}

impl<E> QueryOutput<E> {
    pub fn into_one(self) -> Option<E> {
        match self {
            QueryOutput::One(entity) => Some(entity),
            QueryOutput::Many(_) => None,
        }
    }

    pub fn into_many(self) -> Option<Vec<E>> {
        match self {
            QueryOutput::Many(entities) => Some(entities),
            QueryOutput::One(_) => None,
        }
    }
}

type Call<E> = dyn Fn(&QueryContext, &[Arg]) -> Result<QueryOutput<E>, CallError> + Send + Sync;

/// A compiled finder bound to a store
pub struct Invocable<E> {
    query: Arc<CompiledQuery>,
    signature: Arc<Signature>,
    call: Arc<Call<E>>,
}

impl<E> Clone for Invocable<E> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            signature: Arc::clone(&self.signature),
            call: Arc::clone(&self.call),
        }
    }
}

impl<E> fmt::Debug for Invocable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocable")
            .field("query", &self.query)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl<E> Invocable<E> {
    /// Run the finder. `args` excludes the context.
    pub fn call(&self, ctx: &QueryContext, args: &[Arg]) -> Result<QueryOutput<E>, CallError> {
        (self.call)(ctx, args)
    }

    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Bind a compiled finder to `store`
pub fn bind<E, S>(query: Arc<CompiledQuery>, store: Arc<S>, signature: Signature) -> Invocable<E>
where
    E: 'static,
    S: EntityStore<E> + 'static,
{
    let bound = Arc::clone(&query);
    let call = move |ctx: &QueryContext, args: &[Arg]| -> Result<QueryOutput<E>, CallError> {
        check_args(&bound, args)?;
        match bound.multiplicity {
            Multiplicity::One => store.execute_single(ctx, &bound, args).map(QueryOutput::One),
            Multiplicity::Many => store.execute_many(ctx, &bound, args).map(QueryOutput::Many),
        }
    };

    Invocable {
        query,
        signature: Arc::new(signature),
        call: Arc::new(call),
    }
}

/// Count first, then shape. Nothing is bound when either check fails.
pub fn check_args(query: &CompiledQuery, args: &[Arg]) -> Result<(), CallError> {
    if args.len() != query.arity() {
        return Err(CallError::Arity {
            expected: query.arity(),
            actual: args.len(),
        });
    }

    for (position, (arg, expected)) in args.iter().zip(&query.placeholders).enumerate() {
        if arg.kind() != *expected {
            return Err(CallError::ArgumentShape {
                position,
                expected: *expected,
            });
        }
    }

    Ok(())
}
