//! Procedural macros for lifequery
//!
//! This crate provides `#[derive(Entity)]`. Use it through the `lifequery`
//! re-export rather than depending on it directly.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates the `Entity` and `FromRow` impls
///
/// - `#[table_name = "..."]` on the struct; defaults to the snake_case struct name
/// - `#[primary_key]` on one field; defaults to the field named `id`
/// - `#[column_name = "..."]` renames a column
/// - `#[auto_increment]` leaves the field out of inserted and updated values
///
/// # Example
///
/// ```ignore
/// use lifequery::Entity;
///
/// #[derive(Entity)]
/// #[table_name = "users"]
/// pub struct User {
///     #[primary_key]
///     #[auto_increment]
///     pub id: i64,
///     #[column_name = "login"]
///     pub user_name: String,
///     pub email: Option<String>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(table_name, primary_key, column_name, auto_increment))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}
