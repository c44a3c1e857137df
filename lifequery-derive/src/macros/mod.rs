//! Derive macro implementations

mod entity;

pub use entity::derive_entity;
