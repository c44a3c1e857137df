//! Repository construction and finder call errors.

use crate::executor::LifeError;
use crate::query::parser::ParseError;
use crate::query::plan::{Multiplicity, ValueKind};
use crate::query::signature::SignatureError;
use std::fmt;

/// A finder that could not be bound. Returned from
/// [`RepositoryBuilder::build`](crate::repository::RepositoryBuilder::build);
/// the repository is never created when any finder fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    pub finder: String,
    pub kind: BindErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindErrorKind {
    Parse(ParseError),
    Signature(SignatureError),
    /// The same finder name was declared twice
    Duplicate,
}

impl BindError {
    pub fn new(finder: impl Into<String>, kind: BindErrorKind) -> Self {
        Self {
            finder: finder.into(),
            kind,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BindErrorKind::Parse(e) => write!(f, "cannot bind finder {}: {e}", self.finder),
            BindErrorKind::Signature(e) => write!(f, "cannot bind finder {}: {e}", self.finder),
            BindErrorKind::Duplicate => write!(f, "finder {} is declared twice", self.finder),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            BindErrorKind::Parse(e) => Some(e),
            BindErrorKind::Signature(e) => Some(e),
            BindErrorKind::Duplicate => None,
        }
    }
}

/// Per-invocation failure
#[derive(Debug)]
pub enum CallError {
    /// Argument count differs from the placeholder count
    Arity { expected: usize, actual: usize },
    /// Argument at `position` is a scalar where a list is required, or the reverse
    ArgumentShape { position: usize, expected: ValueKind },
    /// Singular finder matched no row
    NotFound,
    Cancelled,
    DeadlineExceeded,
    /// Store failure, passed through unchanged
    Execution(LifeError),
    UnknownFinder(String),
    /// Finder called through the accessor for the other multiplicity
    Multiplicity {
        finder: String,
        declared: Multiplicity,
    },
}

impl CallError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CallError::NotFound)
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Arity { expected, actual } => write!(
                f,
                "argument count mismatch: expected {expected}, got {actual}"
            ),
            CallError::ArgumentShape { position, expected } => {
                write!(f, "argument {position} must be a {expected}")
            }
            CallError::NotFound => write!(f, "record not found"),
            CallError::Cancelled => write!(f, "query cancelled"),
            CallError::DeadlineExceeded => write!(f, "query deadline exceeded"),
            CallError::Execution(e) => write!(f, "{e}"),
            CallError::UnknownFinder(name) => write!(f, "no finder named {name}"),
            CallError::Multiplicity { finder, declared } => {
                write!(f, "finder {finder} returns a {declared}")
            }
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LifeError> for CallError {
    fn from(err: LifeError) -> Self {
        CallError::Execution(err)
    }
}

impl From<may_postgres::Error> for CallError {
    fn from(err: may_postgres::Error) -> Self {
        CallError::Execution(LifeError::PostgresError(err))
    }
}
