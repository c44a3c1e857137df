//! Structured query plans derived from finder names.
//!
//! A [`QueryPlan`] is the parsed, immutable form of a finder identifier such as
//! `FindAllByStatusInOrderByCreatedAtDescLimit10`. Plans are produced by
//! [`parse_method_name`](crate::query::parser::parse_method_name), checked against
//! the entity's column set with [`QueryPlan::resolve`], and rendered by
//! [`compile`](crate::query::compiler::compile).

use crate::entity::EntityDescriptor;
use crate::query::parser::ParseError;
use std::fmt;

/// How many rows a finder returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    /// `FindBy…` - at most one row, a missing row is an error
    One,
    /// `FindAllBy…` - zero or more rows
    Many,
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::One => write!(f, "single row"),
            Multiplicity::Many => write!(f, "row sequence"),
        }
    }
}

/// Kind of value a placeholder (or an argument) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A single value bound to one placeholder
    Scalar,
    /// A list of values bound to an `IN (?)` placeholder
    Sequence,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Scalar => write!(f, "scalar"),
            ValueKind::Sequence => write!(f, "sequence"),
        }
    }
}

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// Number of placeholder values the operator consumes
    pub fn arity(self) -> usize {
        match self {
            Operator::IsNull | Operator::IsNotNull => 0,
            Operator::Between => 2,
            _ => 1,
        }
    }

    /// SQL token rendered between the column and its placeholders
    pub fn sql_token(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Kinds of the values the operator binds, in placeholder order
    pub fn placeholder_kinds(self) -> &'static [ValueKind] {
        match self {
            Operator::IsNull | Operator::IsNotNull => &[],
            Operator::Between => &[ValueKind::Scalar, ValueKind::Scalar],
            Operator::In => &[ValueKind::Sequence],
            _ => &[ValueKind::Scalar],
        }
    }
}

/// One `column <op> placeholders` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: Operator) -> Self {
        Self {
            column: column.into(),
            operator,
        }
    }

    pub fn arity(&self) -> usize {
        self.operator.arity()
    }
}

/// AND-combined predicates. Groups are OR-combined inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateGroup {
    pub predicates: Vec<Predicate>,
}

impl PredicateGroup {
    pub fn arity(&self) -> usize {
        self.predicates.iter().map(Predicate::arity).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql_token(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ordering {
    pub column: String,
    pub direction: Direction,
}

/// Parsed form of a finder identifier.
///
/// Group order and predicate order within a group are significant: together
/// they fix the left-to-right position of every placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryPlan {
    pub multiplicity: Multiplicity,
    pub groups: Vec<PredicateGroup>,
    pub ordering: Option<Ordering>,
    /// Row limit, `0` when unset
    pub limit: u64,
}

impl QueryPlan {
    /// Total number of placeholder values across all groups
    pub fn arity(&self) -> usize {
        self.groups.iter().map(PredicateGroup::arity).sum()
    }

    /// Predicates in placeholder traversal order (group order, then predicate order)
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.groups.iter().flat_map(|group| group.predicates.iter())
    }

    /// Placeholder kinds in traversal order
    pub fn placeholder_kinds(&self) -> Vec<ValueKind> {
        self.predicates()
            .flat_map(|predicate| predicate.operator.placeholder_kinds().iter().copied())
            .collect()
    }

    /// Check every referenced column against the entity's column set.
    ///
    /// An OrderBy field that names no column is rejected here, together with
    /// unknown predicate fields, so a plan that resolves can never fail at call
    /// time because of a bad identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownColumn`] for the first unresolved column.
    pub fn resolve(&self, entity: &EntityDescriptor) -> Result<(), ParseError> {
        for predicate in self.predicates() {
            if !entity.has_column(&predicate.column) {
                return Err(ParseError::UnknownColumn {
                    column: predicate.column.clone(),
                    table: entity.table_name.to_string(),
                });
            }
        }
        if let Some(ordering) = &self.ordering {
            if !entity.has_column(&ordering.column) {
                return Err(ParseError::UnknownColumn {
                    column: ordering.column.clone(),
                    table: entity.table_name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(groups: Vec<Vec<Predicate>>) -> QueryPlan {
        QueryPlan {
            multiplicity: Multiplicity::Many,
            groups: groups
                .into_iter()
                .map(|predicates| PredicateGroup { predicates })
                .collect(),
            ordering: None,
            limit: 0,
        }
    }

    #[test]
    fn test_operator_arity() {
        assert_eq!(Operator::IsNull.arity(), 0);
        assert_eq!(Operator::IsNotNull.arity(), 0);
        assert_eq!(Operator::Between.arity(), 2);
        assert_eq!(Operator::In.arity(), 1);
        assert_eq!(Operator::Like.arity(), 1);
        assert_eq!(Operator::GreaterThanOrEqual.arity(), 1);
    }

    #[test]
    fn test_placeholder_kinds_follow_traversal_order() {
        let plan = plan(vec![
            vec![
                Predicate::new("status", Operator::In),
                Predicate::new("deleted_at", Operator::IsNull),
            ],
            vec![Predicate::new("created_at", Operator::Between)],
        ]);

        assert_eq!(plan.arity(), 3);
        assert_eq!(
            plan.placeholder_kinds(),
            vec![ValueKind::Sequence, ValueKind::Scalar, ValueKind::Scalar]
        );
    }

    #[test]
    fn test_resolve_rejects_unknown_columns() {
        static COLUMNS: &[&str] = &["id", "status", "created_at"];
        let entity = EntityDescriptor {
            table_name: "orders",
            columns: COLUMNS,
            primary_key: "id",
        };

        let known = plan(vec![vec![Predicate::new("status", Operator::Equal)]]);
        assert!(known.resolve(&entity).is_ok());

        let unknown = plan(vec![vec![Predicate::new("total", Operator::Equal)]]);
        assert!(matches!(
            unknown.resolve(&entity),
            Err(ParseError::UnknownColumn { ref column, .. }) if column == "total"
        ));

        let mut bad_order = known.clone();
        bad_order.ordering = Some(Ordering {
            column: "updated_at".to_string(),
            direction: Direction::Desc,
        });
        assert!(matches!(
            bad_order.resolve(&entity),
            Err(ParseError::UnknownColumn { ref column, .. }) if column == "updated_at"
        ));
    }
}
