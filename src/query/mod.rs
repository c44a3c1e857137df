//! Query derivation: from a finder's method name to an invocable finder.
//!
//! The pipeline runs once per finder, when a repository is built:
//!
//! - [`parser`] turns `FindAllByStatusInOrderByCreatedAtDesc` into a
//!   [`QueryPlan`], converting field tokens with [`case::to_column_name`]
//! - [`signature`] checks the declared parameters and returns against the plan
//! - [`compiler`] renders the plan into a backend neutral [`CompiledQuery`]
//! - [`binder`] wraps the compiled query and a store into an [`Invocable`]
//!
//! Calls then only check the arguments and hand them to the store.
//!
//! # Examples
//!
//! ```
//! use lifequery::query::{compile, parse_method_name, Multiplicity};
//!
//! let plan = parse_method_name("FindAllByStatusInOrderByCreatedAtDescLimit10").unwrap();
//! assert_eq!(plan.multiplicity, Multiplicity::Many);
//!
//! let query = compile(&plan);
//! assert_eq!(query.predicate, "(status IN (?))");
//! assert_eq!(query.order_by, "created_at DESC");
//! assert_eq!(query.limit, 10);
//! ```

pub mod binder;
pub mod case;
pub mod compiler;
pub mod error;
pub mod parser;
pub mod plan;
pub mod signature;
pub mod value_conversion;

pub use binder::{bind, check_args, Arg, IntoArg, Invocable, QueryOutput};
pub use case::to_column_name;
pub use compiler::{compile, CompiledQuery};
pub use error::{BindError, BindErrorKind, CallError};
pub use parser::{parse_method_name, ParseError};
pub use plan::{
    Direction, Multiplicity, Operator, Ordering, Predicate, PredicateGroup, QueryPlan, ValueKind,
};
pub use signature::{validate, ParamKind, ReturnKind, Signature, SignatureError};
pub use value_conversion::with_converted_params;
