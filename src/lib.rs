//! # lifequery
//!
//! Finders derived from method names, executed on PostgreSQL through
//! `may_postgres`.
//!
//! A finder name such as `FindAllByStatusInOrderByCreatedAtDesc` is parsed
//! into a query plan, checked against the entity's columns and the declared
//! signature, compiled once, and bound to an [`EntityStore`]. Calls are
//! synchronous and safe from `may` coroutines.
//!
//! ```no_run
//! use lifequery::prelude::*;
//!
//! #[derive(lifequery::Entity)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     #[auto_increment]
//!     pub id: i64,
//!     pub user_name: String,
//!     pub status: String,
//! }
//!
//! lifequery::repository! {
//!     pub struct UserRepository<User> {
//!         fn FindByUserName(user_name: String) -> User;
//!         fn FindAllByStatusInOrderByIdDesc(statuses: Vec<String>) -> Vec<User>;
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::open(&DatabaseConfig::load()?)?;
//! let users = UserRepository::new(store)?;
//!
//! let ctx = QueryContext::background().with_timeout(std::time::Duration::from_secs(2));
//! let active = users.FindAllByStatusInOrderByIdDesc(&ctx, vec!["active".to_string()])?;
//! # Ok(())
//! # }
//! ```

extern crate self as lifequery;

pub mod config;
pub mod connection;
pub mod context;
pub mod entity;
pub mod executor;
mod macros;
pub mod metrics;
pub mod query;
pub mod raw_sql;
pub mod repository;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::DatabaseConfig;
pub use connection::{connect, ConnectionError};
pub use context::QueryContext;
pub use entity::{Entity, EntityDescriptor, FromRow};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use query::{
    Arg, BindError, BindErrorKind, CallError, CompiledQuery, IntoArg, Invocable, QueryOutput,
    Signature,
};
pub use repository::{Page, Repository, RepositoryBuilder};
pub use store::{EntityStore, PostgresStore};

/// `#[derive(Entity)]`
pub use lifequery_derive::Entity;

pub use may_postgres;
pub use sea_query;

pub mod prelude {
    pub use crate::args;
    pub use crate::config::DatabaseConfig;
    pub use crate::context::QueryContext;
    pub use crate::entity::{Entity, FromRow};
    pub use crate::query::{CallError, Signature};
    pub use crate::repository::Repository;
    pub use crate::store::{EntityStore, PostgresStore};
}
