//! Declarative macros
//!
//! `args!` lives next to [`IntoArg`](crate::query::binder::IntoArg).

mod repository;
