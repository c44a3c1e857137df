//! Repositories: finder registration and invocation.
//!
//! A [`Repository`] owns a table of finders keyed by name. Every finder is
//! parsed, resolved against the entity's columns, validated against its
//! declared [`Signature`], compiled and bound exactly once, in
//! [`RepositoryBuilder::build`]. A single bad declaration fails the whole build.
//!
//! ```no_run
//! use lifequery::prelude::*;
//! # #[derive(lifequery::Entity)]
//! # #[table_name = "users"]
//! # pub struct User { pub id: i64, pub user_name: String, pub email: String }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::open(&DatabaseConfig::load()?)?;
//! let users = Repository::<User, _>::builder(store)
//!     .finder("FindByUserName", Signature::single(1))
//!     .finder("FindAllByEmailLikeOrderByIdDesc", Signature::many(1))
//!     .build()?;
//!
//! let ctx = QueryContext::background();
//! let ada = users.find_one("FindByUserName", &ctx, &args!["ada"])?;
//! # Ok(())
//! # }
//! ```

mod crud;

pub use crud::Page;

use crate::context::QueryContext;
use crate::entity::Entity;
use crate::query::binder::{bind, Arg, Invocable, QueryOutput};
use crate::query::compiler::compile;
use crate::query::error::{BindError, BindErrorKind, CallError};
use crate::query::parser::parse_method_name;
use crate::query::plan::{Multiplicity, QueryPlan};
use crate::query::signature::{validate, Signature};
use crate::store::EntityStore;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// One registered finder
pub struct Slot<E> {
    pub plan: QueryPlan,
    pub invocable: Invocable<E>,
}

pub struct Repository<E, S> {
    store: Arc<S>,
    slots: HashMap<String, Slot<E>>,
}

impl<E, S> Repository<E, S>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    pub fn builder(store: impl Into<Arc<S>>) -> RepositoryBuilder<E, S> {
        RepositoryBuilder {
            store: store.into(),
            declarations: Vec::new(),
            eager_arity: true,
            _entity: PhantomData,
        }
    }
}

impl<E, S> Repository<E, S> {
    /// Call a finder by name
    pub fn invoke(
        &self,
        finder: &str,
        ctx: &QueryContext,
        args: &[Arg],
    ) -> Result<QueryOutput<E>, CallError> {
        self.slot(finder)?.invocable.call(ctx, args)
    }

    /// Call a `FindBy…` finder
    pub fn find_one(&self, finder: &str, ctx: &QueryContext, args: &[Arg]) -> Result<E, CallError> {
        let slot = self.slot(finder)?;
        slot.expect(finder, Multiplicity::One)?;
        match slot.invocable.call(ctx, args)? {
            QueryOutput::One(entity) => Ok(entity),
            QueryOutput::Many(_) => Err(slot.mismatch(finder)),
        }
    }

    /// Call a `FindAllBy…` finder
    pub fn find_many(
        &self,
        finder: &str,
        ctx: &QueryContext,
        args: &[Arg],
    ) -> Result<Vec<E>, CallError> {
        let slot = self.slot(finder)?;
        slot.expect(finder, Multiplicity::Many)?;
        match slot.invocable.call(ctx, args)? {
            QueryOutput::Many(entities) => Ok(entities),
            QueryOutput::One(_) => Err(slot.mismatch(finder)),
        }
    }

    pub fn invocable(&self, finder: &str) -> Option<&Invocable<E>> {
        self.slots.get(finder).map(|slot| &slot.invocable)
    }

    pub fn plan(&self, finder: &str) -> Option<&QueryPlan> {
        self.slots.get(finder).map(|slot| &slot.plan)
    }

    /// Registered finder names, in no particular order
    pub fn finders(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn slot(&self, finder: &str) -> Result<&Slot<E>, CallError> {
        self.slots
            .get(finder)
            .ok_or_else(|| CallError::UnknownFinder(finder.to_string()))
    }
}

impl<E> Slot<E> {
    fn expect(&self, finder: &str, multiplicity: Multiplicity) -> Result<(), CallError> {
        if self.plan.multiplicity == multiplicity {
            Ok(())
        } else {
            Err(self.mismatch(finder))
        }
    }

    fn mismatch(&self, finder: &str) -> CallError {
        CallError::Multiplicity {
            finder: finder.to_string(),
            declared: self.plan.multiplicity,
        }
    }
}

/// Collects finder declarations for a [`Repository`]
pub struct RepositoryBuilder<E, S> {
    store: Arc<S>,
    declarations: Vec<(String, Signature)>,
    eager_arity: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S> RepositoryBuilder<E, S>
where
    E: Entity,
    S: EntityStore<E> + 'static,
{
    pub fn finder(mut self, name: impl Into<String>, signature: Signature) -> Self {
        self.declarations.push((name.into(), signature));
        self
    }

    /// Compare declared value parameters with placeholders at build time (on by default).
    ///
    /// Arguments are always checked per call, whatever this is set to.
    pub fn eager_arity(mut self, enabled: bool) -> Self {
        self.eager_arity = enabled;
        self
    }

    /// Bind every declared finder.
    ///
    /// # Errors
    ///
    /// The first [`BindError`] encountered; no repository is returned.
    pub fn build(self) -> Result<Repository<E, S>, BindError> {
        let descriptor = E::descriptor();
        let mut slots = HashMap::with_capacity(self.declarations.len());

        for (name, signature) in self.declarations {
            if slots.contains_key(&name) {
                return Err(BindError::new(name, BindErrorKind::Duplicate));
            }

            let plan = parse_method_name(&name)
                .and_then(|plan| plan.resolve(&descriptor).map(|()| plan))
                .map_err(|e| BindError::new(&name, BindErrorKind::Parse(e)))?;

            validate(&signature, plan.multiplicity)
                .map_err(|e| BindError::new(&name, BindErrorKind::Signature(e)))?;

            let query = Arc::new(compile(&plan));
            if self.eager_arity {
                signature
                    .check_arity(&query)
                    .map_err(|e| BindError::new(&name, BindErrorKind::Signature(e)))?;
            }

            log::debug!(
                "bound finder {name} on {}: WHERE {}",
                descriptor.table_name,
                query.predicate
            );

            let invocable = bind(query, Arc::clone(&self.store), signature);
            slots.insert(name, Slot { plan, invocable });
        }

        log::info!(
            "repository for {} ready with {} finders",
            descriptor.table_name,
            slots.len()
        );

        Ok(Repository {
            store: self.store,
            slots,
        })
    }
}
