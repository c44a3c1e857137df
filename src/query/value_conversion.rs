//! Value conversion from SeaQuery to may_postgres.
//!
//! Finder arguments and CRUD statements carry `sea_query::Value`s. Each value
//! is turned into an owned `ToSql` box, and the closure passed to
//! [`with_converted_params`] receives references into those boxes, so the
//! parameters stay valid for the whole database call.
//!
//! NULLs keep the type of their variant (`Value::String(None)` binds as a
//! text NULL) so PostgreSQL can type-check them against the column.

use crate::executor::LifeError;
use may_postgres::types::ToSql;
use sea_query::Value;

type Param = Box<dyn ToSql + Sync>;

/// Convert SeaQuery values and run `f` with the resulting parameters.
///
/// # Errors
///
/// Returns `LifeError::Other` for value types PostgreSQL cannot bind, or an
/// unsigned value that does not fit in `i64`.
pub fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let owned = values
        .iter()
        .map(to_param)
        .collect::<Result<Vec<Param>, LifeError>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| &**p as &dyn ToSql).collect();
    f(&params)
}

fn to_param(value: &Value) -> Result<Param, LifeError> {
    let param: Param = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => Box::new(
            v.map(|u| {
                i64::try_from(u).map_err(|_| {
                    LifeError::Other(format!(
                        "BigUnsigned value {u} exceeds i64::MAX ({}), cannot be safely cast to i64",
                        i64::MAX
                    ))
                })
            })
            .transpose()?,
        ),
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.as_ref().map(|s| String::clone(s))),
        Value::Char(v) => Box::new(v.map(String::from)),
        Value::Bytes(v) => Box::new(v.as_ref().map(|b| Vec::<u8>::clone(b))),
        Value::Json(v) => Box::new(v.as_ref().map(|j| serde_json::Value::clone(j))),
        Value::Uuid(v) => Box::new(v.as_ref().map(|u| uuid::Uuid::clone(u))),
        Value::Decimal(v) => Box::new(v.as_ref().map(|d| rust_decimal::Decimal::clone(d))),
        Value::ChronoDate(v) => Box::new(v.as_ref().map(|d| chrono::NaiveDate::clone(d))),
        Value::ChronoTime(v) => Box::new(v.as_ref().map(|t| chrono::NaiveTime::clone(t))),
        Value::ChronoDateTime(v) => {
            Box::new(v.as_ref().map(|dt| chrono::NaiveDateTime::clone(dt)))
        }
        Value::ChronoDateTimeUtc(v) => {
            Box::new(v.as_ref().map(|dt| chrono::DateTime::<chrono::Utc>::clone(dt)))
        }
        Value::ChronoDateTimeWithTimeZone(v) => Box::new(
            v.as_ref()
                .map(|dt| chrono::DateTime::<chrono::FixedOffset>::clone(dt)),
        ),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(LifeError::Other(format!(
                "Unsupported value type in query: {value:?}"
            )))
        }
    };
    Ok(param)
}
