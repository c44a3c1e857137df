//! Entity descriptors.
//!
//! Finders never look at a struct's fields at runtime. Everything the query
//! core needs about a row type is exposed statically through [`Entity`],
//! normally generated with `#[derive(Entity)]`:
//!
//! ```ignore
//! use lifequery::Entity;
//!
//! #[derive(Entity)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     #[auto_increment]
//!     pub id: i64,
//!     pub user_name: String,
//!     pub email: String,
//! }
//! ```

use may_postgres::types::{FromSql, Type};
use may_postgres::Row;
use sea_query::Value;
use std::error::Error;

/// Table name, column set and primary key of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub table_name: &'static str,
    pub columns: &'static [&'static str],
    pub primary_key: &'static str,
}

impl EntityDescriptor {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

/// A row type bound to one table
pub trait Entity: Sized + Send + 'static {
    /// Primary key type
    type Id: Into<Value> + Clone + Send + Sync;

    const TABLE_NAME: &'static str;
    /// Every column, in declaration order
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str;

    fn primary_key(&self) -> Self::Id;

    /// Column values written on insert and update.
    ///
    /// Auto-increment columns are left out so the database assigns them.
    fn values(&self) -> Vec<(&'static str, Value)>;

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor {
            table_name: Self::TABLE_NAME,
            columns: Self::COLUMNS,
            primary_key: Self::PRIMARY_KEY,
        }
    }
}

/// Trait for types that can be created from a database row
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error>;
}

/// Unsigned field decoded from the signed column that stores it.
///
/// PostgreSQL has no unsigned integers. Negative or out-of-range values fail
/// the row instead of wrapping.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsigned<T>(pub T);

macro_rules! unsigned_from_sql {
    ($($unsigned:ty => $signed:ty),* $(,)?) => {$(
        impl<'a> FromSql<'a> for Unsigned<$unsigned> {
            fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
                let value = <$signed as FromSql>::from_sql(ty, raw)?;
                let value = <$unsigned>::try_from(value).map_err(|_| {
                    format!("{value} is out of range for {}", stringify!($unsigned))
                })?;
                Ok(Unsigned(value))
            }

            fn accepts(ty: &Type) -> bool {
                <$signed as FromSql>::accepts(ty)
            }
        }
    )*};
}

unsigned_from_sql!(u8 => i16, u16 => i32, u32 => i64, u64 => i64);
