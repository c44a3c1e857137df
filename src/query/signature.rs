//! Declared finder shapes and their validation.
//!
//! A [`Signature`] describes what a finder slot looks like from the caller's
//! side: a context handle, the value parameters, and a `(result, error)` pair.
//! [`validate`] checks it against the multiplicity of the parsed plan;
//! [`Signature::check_arity`] optionally compares the value parameters with
//! the compiled placeholders before any call is made.

use crate::query::compiler::CompiledQuery;
use crate::query::plan::{Multiplicity, ValueKind};
use std::fmt;

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The cancellable [`QueryContext`](crate::context::QueryContext) handle
    Context,
    /// A positional value bound to a placeholder
    Value(ValueKind),
    /// Any number of trailing values; the count is only known per call
    Variadic,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Context => write!(f, "context"),
            ParamKind::Value(kind) => write!(f, "{kind} value"),
            ParamKind::Variadic => write!(f, "variadic values"),
        }
    }
}

/// One declared return value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// A single entity
    Single,
    /// A sequence of entities
    Sequence,
    /// The error slot
    Error,
    /// Anything else, named for diagnostics
    Other(&'static str),
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Single => write!(f, "entity"),
            ReturnKind::Sequence => write!(f, "entity sequence"),
            ReturnKind::Error => write!(f, "error"),
            ReturnKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Why a declared shape does not fit its finder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// First parameter is not the context handle
    MissingContext,
    /// Not exactly two return values
    ReturnCount(usize),
    /// Second return value is not the error slot
    LastReturnNotError(ReturnKind),
    /// `FindAllBy` must return a sequence, `FindBy` a single entity
    MultiplicityMismatch {
        multiplicity: Multiplicity,
        declared: ReturnKind,
    },
    /// Eager check: number of value parameters differs from the placeholders
    ArityMismatch { declared: usize, expected: usize },
    /// Eager check: a value parameter has the wrong kind for its placeholder
    ParamShapeMismatch {
        position: usize,
        expected: ValueKind,
        declared: ValueKind,
    },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::MissingContext => {
                write!(f, "first parameter must be the query context")
            }
            SignatureError::ReturnCount(n) => {
                write!(f, "expected 2 return values (result, error), found {n}")
            }
            SignatureError::LastReturnNotError(kind) => {
                write!(f, "last return value must be the error, found {kind}")
            }
            SignatureError::MultiplicityMismatch {
                multiplicity,
                declared,
            } => write!(
                f,
                "finder returns a {multiplicity} but the declaration returns {declared}"
            ),
            SignatureError::ArityMismatch { declared, expected } => write!(
                f,
                "declared {declared} value parameters, query has {expected} placeholders"
            ),
            SignatureError::ParamShapeMismatch {
                position,
                expected,
                declared,
            } => write!(
                f,
                "parameter {position} is declared {declared}, placeholder expects {expected}"
            ),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Declared shape of a finder slot.
///
/// ```
/// use lifequery::query::signature::Signature;
/// use lifequery::query::plan::ValueKind;
///
/// // fn(ctx, status: Vec<String>, total: i64) -> (Vec<Order>, error)
/// let sig = Signature::new()
///     .context()
///     .value(ValueKind::Sequence)
///     .value(ValueKind::Scalar)
///     .sequence()
///     .error();
/// assert_eq!(sig.value_params().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamKind>,
    pub returns: Vec<ReturnKind>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(ctx, scalar * n) -> (entity, error)`
    pub fn single(scalars: usize) -> Self {
        (0..scalars)
            .fold(Self::new().context(), |sig, _| sig.value(ValueKind::Scalar))
            .returns(ReturnKind::Single)
            .error()
    }

    /// `(ctx, scalar * n) -> (entities, error)`
    pub fn many(scalars: usize) -> Self {
        (0..scalars)
            .fold(Self::new().context(), |sig, _| sig.value(ValueKind::Scalar))
            .returns(ReturnKind::Sequence)
            .error()
    }

    pub fn context(self) -> Self {
        self.param(ParamKind::Context)
    }

    pub fn value(self, kind: ValueKind) -> Self {
        self.param(ParamKind::Value(kind))
    }

    pub fn variadic(self) -> Self {
        self.param(ParamKind::Variadic)
    }

    pub fn param(mut self, kind: ParamKind) -> Self {
        self.params.push(kind);
        self
    }

    pub fn returns(mut self, kind: ReturnKind) -> Self {
        self.returns.push(kind);
        self
    }

    pub fn sequence(self) -> Self {
        self.returns(ReturnKind::Sequence)
    }

    pub fn error(self) -> Self {
        self.returns(ReturnKind::Error)
    }

    pub fn is_variadic(&self) -> bool {
        self.params.contains(&ParamKind::Variadic)
    }

    /// Kinds of the declared value parameters, in order
    pub fn value_params(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.params.iter().filter_map(|param| match param {
            ParamKind::Value(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Compare declared value parameters with the compiled placeholders.
    ///
    /// Declarations with a variadic tail always pass; their arity is only
    /// known at call time. Otherwise this applies the same count and kind rule
    /// the binder enforces per call.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::ArityMismatch`] or
    /// [`SignatureError::ParamShapeMismatch`].
    pub fn check_arity(&self, query: &CompiledQuery) -> Result<(), SignatureError> {
        if self.is_variadic() {
            return Ok(());
        }

        let declared: Vec<ValueKind> = self.value_params().collect();
        if declared.len() != query.arity() {
            return Err(SignatureError::ArityMismatch {
                declared: declared.len(),
                expected: query.arity(),
            });
        }

        for (position, (have, want)) in declared.iter().zip(&query.placeholders).enumerate() {
            if have != want {
                return Err(SignatureError::ParamShapeMismatch {
                    position,
                    expected: *want,
                    declared: *have,
                });
            }
        }

        Ok(())
    }
}

/// Check a declared shape against the plan's multiplicity.
///
/// Checks run in order and the first failure is reported: context first,
/// then the `(result, error)` pair, then the result kind.
pub fn validate(signature: &Signature, multiplicity: Multiplicity) -> Result<(), SignatureError> {
    if signature.params.first() != Some(&ParamKind::Context) {
        return Err(SignatureError::MissingContext);
    }

    if signature.returns.len() != 2 {
        return Err(SignatureError::ReturnCount(signature.returns.len()));
    }
    if signature.returns[1] != ReturnKind::Error {
        return Err(SignatureError::LastReturnNotError(signature.returns[1]));
    }

    let expected = match multiplicity {
        Multiplicity::One => ReturnKind::Single,
        Multiplicity::Many => ReturnKind::Sequence,
    };
    if signature.returns[0] != expected {
        return Err(SignatureError::MultiplicityMismatch {
            multiplicity,
            declared: signature.returns[0],
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compiler::compile;
    use crate::query::parser::parse_method_name;

    #[test]
    fn test_valid_signatures() {
        assert_eq!(validate(&Signature::single(1), Multiplicity::One), Ok(()));
        assert_eq!(validate(&Signature::many(0), Multiplicity::Many), Ok(()));
    }

    #[test]
    fn test_missing_context() {
        let sig = Signature::new()
            .value(ValueKind::Scalar)
            .returns(ReturnKind::Single)
            .error();
        assert_eq!(
            validate(&sig, Multiplicity::One),
            Err(SignatureError::MissingContext)
        );

        // context present but not first
        let sig = Signature::new()
            .value(ValueKind::Scalar)
            .context()
            .returns(ReturnKind::Single)
            .error();
        assert_eq!(
            validate(&sig, Multiplicity::One),
            Err(SignatureError::MissingContext)
        );
    }

    #[test]
    fn test_return_shape() {
        let sig = Signature::new().context().returns(ReturnKind::Single);
        assert_eq!(
            validate(&sig, Multiplicity::One),
            Err(SignatureError::ReturnCount(1))
        );

        let sig = Signature::new()
            .context()
            .returns(ReturnKind::Single)
            .returns(ReturnKind::Other("bool"));
        assert_eq!(
            validate(&sig, Multiplicity::One),
            Err(SignatureError::LastReturnNotError(ReturnKind::Other("bool")))
        );
    }

    #[test]
    fn test_multiplicity_mismatch() {
        assert_eq!(
            validate(&Signature::single(1), Multiplicity::Many),
            Err(SignatureError::MultiplicityMismatch {
                multiplicity: Multiplicity::Many,
                declared: ReturnKind::Single,
            })
        );
        assert!(matches!(
            validate(&Signature::many(1), Multiplicity::One),
            Err(SignatureError::MultiplicityMismatch { .. })
        ));
    }

    #[test]
    fn test_check_arity() {
        let query = compile(&parse_method_name("FindAllByStatusInAndTotalGreaterThan").unwrap());

        let good = Signature::new()
            .context()
            .value(ValueKind::Sequence)
            .value(ValueKind::Scalar)
            .sequence()
            .error();
        assert_eq!(good.check_arity(&query), Ok(()));

        assert_eq!(
            Signature::many(1).check_arity(&query),
            Err(SignatureError::ArityMismatch {
                declared: 1,
                expected: 2
            })
        );
        assert_eq!(
            Signature::many(2).check_arity(&query),
            Err(SignatureError::ParamShapeMismatch {
                position: 0,
                expected: ValueKind::Sequence,
                declared: ValueKind::Scalar,
            })
        );

        let variadic = Signature::new().context().variadic().sequence().error();
        assert_eq!(variadic.check_arity(&query), Ok(()));
    }
}
