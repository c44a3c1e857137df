//! Method name parser.
//!
//! Turns a finder identifier into a [`QueryPlan`]:
//!
//! ```text
//! FindAllBy StatusIn And TotalGreaterThan Or DeletedAtIsNull OrderBy CreatedAtDesc Limit 10
//! └prefix─┘ └──────────── predicate segment ──────────────┘ └─ ordering + limit segment ─┘
//! ```
//!
//! Markers (`OrderBy`, `Limit`, `Or`, `And`) are only recognised when they form
//! a whole camel-case word, so fields such as `Organization` or `Android` are
//! never split apart. `Limit` is only looked for after `OrderBy`, and there the
//! last whole-word `Limit` wins: an ordering column such as `LimitAmount` needs a
//! trailing `Limit<n>` (`OrderByLimitAmountLimit3`), since a bare
//! `OrderByLimitAmount` reads `Amount` as the limit and fails.

use crate::query::case::to_column_name;
use crate::query::plan::{
    Direction, Multiplicity, Operator, Ordering, Predicate, PredicateGroup, QueryPlan,
};
use std::fmt;

const SINGULAR_PREFIX: &str = "FindBy";
const PLURAL_PREFIX: &str = "FindAllBy";
const ORDER_MARKER: &str = "OrderBy";
const LIMIT_MARKER: &str = "Limit";
const OR_SEPARATOR: &str = "Or";
const AND_SEPARATOR: &str = "And";

/// Operator suffixes, most specific first.
///
/// A shorter suffix must never precede a longer one that ends with it,
/// otherwise `TotalGreaterThanEqual` would parse as `TotalGreater` + `ThanEqual`.
const OPERATOR_SUFFIXES: &[(&str, Operator)] = &[
    ("GreaterThanEqual", Operator::GreaterThanOrEqual),
    ("LessThanEqual", Operator::LessThanOrEqual),
    ("GreaterThan", Operator::GreaterThan),
    ("LessThan", Operator::LessThan),
    ("NotEqual", Operator::NotEqual),
    ("IsNotNull", Operator::IsNotNull),
    ("IsNull", Operator::IsNull),
    ("Between", Operator::Between),
    ("Like", Operator::Like),
    ("In", Operator::In),
];

/// Errors raised while parsing a finder name or resolving it against an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Name starts with neither `FindBy` nor `FindAllBy`
    MissingPrefix(String),
    /// Text after `Limit` is not a non-negative decimal integer
    InvalidLimit(String),
    /// Nothing left to filter on after the prefix
    NoPredicate(String),
    /// A term is nothing but an operator suffix or separator, e.g. `FindByIn`
    EmptyField(String),
    /// `OrderBy` is not followed by a field name
    MissingOrderField(String),
    /// A predicate or ordering field names no column of the entity
    UnknownColumn { column: String, table: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingPrefix(name) => write!(
                f,
                "missing prefix: '{name}' must start with {SINGULAR_PREFIX} or {PLURAL_PREFIX}"
            ),
            ParseError::InvalidLimit(limit) => {
                write!(f, "invalid limit: '{limit}' is not a non-negative integer")
            }
            ParseError::NoPredicate(name) => write!(f, "no predicate in '{name}'"),
            ParseError::EmptyField(term) => write!(f, "empty field name in term '{term}'"),
            ParseError::MissingOrderField(name) => {
                write!(f, "missing field after {ORDER_MARKER} in '{name}'")
            }
            ParseError::UnknownColumn { column, table } => {
                write!(f, "unknown column '{column}' for table '{table}'")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a finder identifier into a [`QueryPlan`].
///
/// Parsing is pure: the same identifier always yields an equal plan. Column
/// names are not checked here; see [`QueryPlan::resolve`].
///
/// # Errors
///
/// Returns a [`ParseError`] when the identifier is malformed.
///
/// # Examples
///
/// ```
/// use lifequery::query::parser::parse_method_name;
/// use lifequery::query::plan::{Direction, Multiplicity, Operator};
///
/// let plan = parse_method_name("FindAllByCreatedAtGreaterThanOrderByCreatedAtDescLimit5")?;
/// assert_eq!(plan.multiplicity, Multiplicity::Many);
/// assert_eq!(plan.groups[0].predicates[0].operator, Operator::GreaterThan);
/// let ordering = plan.ordering.as_ref().unwrap();
/// assert_eq!((ordering.column.as_str(), ordering.direction), ("created_at", Direction::Desc));
/// assert_eq!(plan.limit, 5);
/// # Ok::<(), lifequery::query::parser::ParseError>(())
/// ```
pub fn parse_method_name(name: &str) -> Result<QueryPlan, ParseError> {
    let (multiplicity, rest) = if let Some(rest) = name.strip_prefix(PLURAL_PREFIX) {
        (Multiplicity::Many, rest)
    } else if let Some(rest) = name.strip_prefix(SINGULAR_PREFIX) {
        (Multiplicity::One, rest)
    } else {
        return Err(ParseError::MissingPrefix(name.to_string()));
    };

    let (predicate_segment, ordering, limit) = match find_marker(rest, ORDER_MARKER, 0) {
        Some(at) => {
            let (ordering, limit) = parse_ordering(name, &rest[at + ORDER_MARKER.len()..])?;
            (&rest[..at], Some(ordering), limit)
        }
        None => (rest, None, 0),
    };

    if predicate_segment.is_empty() {
        return Err(ParseError::NoPredicate(name.to_string()));
    }

    let groups = split_words(predicate_segment, OR_SEPARATOR)
        .into_iter()
        .map(|group| {
            split_words(group, AND_SEPARATOR)
                .into_iter()
                .map(parse_term)
                .collect::<Result<Vec<_>, _>>()
                .map(|predicates| PredicateGroup { predicates })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryPlan {
        multiplicity,
        groups,
        ordering,
        limit,
    })
}

/// Parse `<Field>[Asc|Desc][Limit<n>]`
fn parse_ordering(name: &str, segment: &str) -> Result<(Ordering, u64), ParseError> {
    let (field, limit) = match rfind_marker(segment, LIMIT_MARKER) {
        Some(at) => {
            let digits = &segment[at + LIMIT_MARKER.len()..];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseError::InvalidLimit(digits.to_string()));
            }
            let limit = digits
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidLimit(digits.to_string()))?;
            (&segment[..at], limit)
        }
        None => (segment, 0),
    };

    let (field, direction) = if let Some(field) = field.strip_suffix("Desc") {
        (field, Direction::Desc)
    } else if let Some(field) = field.strip_suffix("Asc") {
        (field, Direction::Asc)
    } else {
        (field, Direction::Asc)
    };

    if field.is_empty() {
        return Err(ParseError::MissingOrderField(name.to_string()));
    }

    Ok((
        Ordering {
            column: to_column_name(field),
            direction,
        },
        limit,
    ))
}

fn parse_term(term: &str) -> Result<Predicate, ParseError> {
    let (field, operator) = OPERATOR_SUFFIXES
        .iter()
        .find_map(|(suffix, operator)| term.strip_suffix(suffix).map(|field| (field, *operator)))
        .unwrap_or((term, Operator::Equal));

    if field.is_empty() {
        return Err(ParseError::EmptyField(term.to_string()));
    }

    Ok(Predicate::new(to_column_name(field), operator))
}

/// A marker is a whole word when the character after it starts a new word.
fn is_word_end(s: &str, end: usize) -> bool {
    s[end..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_lowercase())
}

fn find_marker(s: &str, marker: &str, from: usize) -> Option<usize> {
    s[from..]
        .match_indices(marker)
        .map(|(at, _)| at + from)
        .find(|&at| is_word_end(s, at + marker.len()))
}

fn rfind_marker(s: &str, marker: &str) -> Option<usize> {
    s.rmatch_indices(marker)
        .map(|(at, _)| at)
        .find(|&at| is_word_end(s, at + marker.len()))
}

/// Split on a separator word. Empty pieces are kept so that they surface as
/// [`ParseError::EmptyField`] instead of being silently dropped.
fn split_words<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut from = 0;
    while let Some(at) = find_marker(s, separator, from) {
        pieces.push(&s[start..at]);
        start = at + separator.len();
        from = start;
    }
    pieces.push(&s[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::plan::ValueKind;

    fn operators(plan: &QueryPlan) -> Vec<Operator> {
        plan.predicates().map(|p| p.operator).collect()
    }

    #[test]
    fn test_two_equal_predicates() {
        let plan = parse_method_name("FindByUserNameAndEmail").unwrap();

        assert_eq!(plan.multiplicity, Multiplicity::One);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(
            plan.groups[0].predicates,
            vec![
                Predicate::new("user_name", Operator::Equal),
                Predicate::new("email", Operator::Equal),
            ]
        );
        assert!(plan.predicates().all(|p| p.arity() == 1));
        assert_eq!(plan.arity(), 2);
        assert_eq!(plan.ordering, None);
        assert_eq!(plan.limit, 0);
    }

    #[test]
    fn test_longest_suffix_wins() {
        let plan = parse_method_name("FindByTotalGreaterThanEqualAndStatusNotEqual").unwrap();
        assert_eq!(
            operators(&plan),
            vec![Operator::GreaterThanOrEqual, Operator::NotEqual]
        );
        assert_eq!(plan.groups[0].predicates[0].column, "total");

        let plan = parse_method_name("FindByTotalLessThanEqual").unwrap();
        assert_eq!(operators(&plan), vec![Operator::LessThanOrEqual]);

        let plan = parse_method_name("FindByDeletedAtIsNotNull").unwrap();
        assert_eq!(operators(&plan), vec![Operator::IsNotNull]);
        assert_eq!(plan.groups[0].predicates[0].column, "deleted_at");
    }

    #[test]
    fn test_suffix_table_order() {
        // A suffix may only appear after every longer suffix that ends with it.
        for (i, (later, _)) in OPERATOR_SUFFIXES.iter().enumerate() {
            for (earlier, _) in &OPERATOR_SUFFIXES[..i] {
                assert!(
                    !later.ends_with(earlier) || later == earlier,
                    "{earlier} shadows {later}"
                );
            }
        }
    }

    #[test]
    fn test_plural_with_ordering_and_limit() {
        let plan =
            parse_method_name("FindAllByCreatedAtGreaterThanOrderByCreatedAtDescLimit5").unwrap();

        assert_eq!(plan.multiplicity, Multiplicity::Many);
        assert_eq!(
            plan.groups,
            vec![PredicateGroup {
                predicates: vec![Predicate::new("created_at", Operator::GreaterThan)],
            }]
        );
        assert_eq!(
            plan.ordering,
            Some(Ordering {
                column: "created_at".to_string(),
                direction: Direction::Desc,
            })
        );
        assert_eq!(plan.limit, 5);
    }

    #[test]
    fn test_ordering_defaults_to_ascending() {
        let plan = parse_method_name("FindAllByStatusOrderByName").unwrap();
        let ordering = plan.ordering.unwrap();
        assert_eq!(ordering.column, "name");
        assert_eq!(ordering.direction, Direction::Asc);

        let plan = parse_method_name("FindAllByStatusOrderByNameAscLimit20").unwrap();
        assert_eq!(plan.ordering.unwrap().direction, Direction::Asc);
        assert_eq!(plan.limit, 20);
    }

    #[test]
    fn test_in_and_between() {
        let plan = parse_method_name("FindByStatusIn").unwrap();
        assert_eq!(operators(&plan), vec![Operator::In]);
        assert_eq!(plan.arity(), 1);
        assert_eq!(plan.placeholder_kinds(), vec![ValueKind::Sequence]);

        let plan = parse_method_name("FindByCreatedAtBetween").unwrap();
        assert_eq!(operators(&plan), vec![Operator::Between]);
        assert_eq!(plan.arity(), 2);
    }

    #[test]
    fn test_or_groups() {
        let plan = parse_method_name("FindAllByStatusAndTotalLessThanOrDeletedAtIsNull").unwrap();

        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].predicates.len(), 2);
        assert_eq!(
            plan.groups[1].predicates,
            vec![Predicate::new("deleted_at", Operator::IsNull)]
        );
        assert_eq!(plan.arity(), 2);
    }

    #[test]
    fn test_separators_inside_words_are_ignored() {
        let plan = parse_method_name("FindByOrganizationAndAndroidVersion").unwrap();
        assert_eq!(
            plan.groups[0].predicates,
            vec![
                Predicate::new("organization", Operator::Equal),
                Predicate::new("android_version", Operator::Equal),
            ]
        );

        let plan = parse_method_name("FindAllByBorderColorOrderByLimitAmountLimit3").unwrap();
        assert_eq!(plan.groups[0].predicates[0].column, "border_color");
        assert_eq!(plan.ordering.unwrap().column, "limit_amount");
        assert_eq!(plan.limit, 3);
        assert_eq!(
            parse_method_name("FindAllByStatusOrderByLimitAmount"),
            Err(ParseError::InvalidLimit("Amount".to_string()))
        );
    }

    #[test]
    fn test_limit_without_order_by_is_part_of_the_field() {
        let plan = parse_method_name("FindAllByStatusLimit5").unwrap();
        assert_eq!(
            plan.groups[0].predicates,
            vec![Predicate::new("status_limit5", Operator::Equal)]
        );
        assert_eq!(plan.ordering, None);
        assert_eq!(plan.limit, 0);
    }

    #[test]
    fn test_idempotent() {
        let name = "FindAllByStatusInOrTotalBetweenOrderByIdDescLimit7";
        assert_eq!(
            parse_method_name(name).unwrap(),
            parse_method_name(name).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_method_name("GetByEmail"),
            Err(ParseError::MissingPrefix("GetByEmail".to_string()))
        );
        assert_eq!(
            parse_method_name("FindBy"),
            Err(ParseError::NoPredicate("FindBy".to_string()))
        );
        assert_eq!(
            parse_method_name("FindAllByOrderByName"),
            Err(ParseError::NoPredicate("FindAllByOrderByName".to_string()))
        );
        assert_eq!(
            parse_method_name("FindAllByStatusOrderByNameLimitFive"),
            Err(ParseError::InvalidLimit("Five".to_string()))
        );
        assert_eq!(
            parse_method_name("FindAllByStatusOrderByNameLimit"),
            Err(ParseError::InvalidLimit(String::new()))
        );
        assert!(matches!(
            parse_method_name("FindAllByStatusOrderByDesc"),
            Err(ParseError::MissingOrderField(_))
        ));
        assert_eq!(
            parse_method_name("FindByIn"),
            Err(ParseError::EmptyField("In".to_string()))
        );
        // EDGE CASE: dangling separator leaves an empty term
        assert_eq!(
            parse_method_name("FindByStatusAnd"),
            Err(ParseError::EmptyField(String::new()))
        );
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::MissingPrefix("Load".to_string());
        assert!(err.to_string().contains("missing prefix"));
        let err = ParseError::InvalidLimit("x".to_string());
        assert!(err.to_string().contains("invalid limit"));
    }
}
