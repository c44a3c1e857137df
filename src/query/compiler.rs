//! Query compiler: renders a [`QueryPlan`] into a [`CompiledQuery`].
//!
//! The output is backend neutral. Placeholders are `?` in traversal order;
//! stores renumber them for their own dialect (see
//! [`store::statement`](crate::store::statement)).

use crate::query::plan::{Multiplicity, Operator, Predicate, PredicateGroup, QueryPlan, ValueKind};

/// Immutable rendering of a query plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// `(a = ? AND b IN (?)) OR (c IS NULL)`
    pub predicate: String,
    /// `created_at DESC`, or empty when the finder declares no ordering
    pub order_by: String,
    /// Row limit, `0` when unset
    pub limit: u64,
    pub multiplicity: Multiplicity,
    /// Kind of every `?` in `predicate`, left to right
    pub placeholders: Vec<ValueKind>,
    /// `predicate` with every column as a quoted identifier
    pub quoted_predicate: String,
    /// `order_by` with the column as a quoted identifier
    pub quoted_order_by: String,
}

impl CompiledQuery {
    /// Number of arguments a call must supply
    pub fn arity(&self) -> usize {
        self.placeholders.len()
    }
}

/// Render a plan. Column names are emitted as-is; resolve the plan against
/// the entity first.
///
/// Stores send the quoted forms so that columns such as `user` or `order`
/// are not read as keywords.
pub fn compile(plan: &QueryPlan) -> CompiledQuery {
    CompiledQuery {
        predicate: render_predicates(plan, bare),
        order_by: render_ordering(plan, bare),
        limit: plan.limit,
        multiplicity: plan.multiplicity,
        placeholders: plan.placeholder_kinds(),
        quoted_predicate: render_predicates(plan, quote_identifier),
        quoted_order_by: render_ordering(plan, quote_identifier),
    }
}

/// `"name"`, with embedded double quotes doubled
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn bare(name: &str) -> String {
    name.to_string()
}

fn render_predicates(plan: &QueryPlan, column: fn(&str) -> String) -> String {
    plan.groups
        .iter()
        .map(|group| render_group(group, column))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn render_ordering(plan: &QueryPlan, column: fn(&str) -> String) -> String {
    plan.ordering
        .as_ref()
        .map(|ordering| {
            format!(
                "{} {}",
                column(&ordering.column),
                ordering.direction.sql_token()
            )
        })
        .unwrap_or_default()
}

fn render_group(group: &PredicateGroup, column: fn(&str) -> String) -> String {
    let terms = group
        .predicates
        .iter()
        .map(|predicate| render_predicate(predicate, column))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!("({terms})")
}

fn render_predicate(predicate: &Predicate, column: fn(&str) -> String) -> String {
    let column = column(&predicate.column);
    let token = predicate.operator.sql_token();
    match predicate.operator {
        Operator::IsNull | Operator::IsNotNull => format!("{column} {token}"),
        Operator::In => format!("{column} {token} (?)"),
        Operator::Between => format!("{column} {token} ? AND ?"),
        _ => format!("{column} {token} ?"),
    }
}
