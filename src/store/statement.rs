//! SQL statements for PostgreSQL.
//!
//! Compiled finders and user predicates use `?` placeholders. PostgreSQL wants
//! numbered `$n` parameters, and a list argument needs one parameter per
//! element, so the final text is only known once the arguments are.

use crate::entity::EntityDescriptor;
use crate::query::binder::Arg;
use crate::query::compiler::{quote_identifier, CompiledQuery};
use crate::query::error::CallError;
use crate::query::plan::Multiplicity;
use sea_query::Value;

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// `SELECT * FROM "<table>" WHERE … [ORDER BY …] [LIMIT n]` for a compiled finder.
    ///
    /// Singular finders read the first row only; without a declared ordering
    /// they order by primary key so that "first" is deterministic. Columns go
    /// out as quoted identifiers.
    pub fn finder(
        entity: &EntityDescriptor,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<Self, CallError> {
        let (predicate, values) = render_placeholders(&query.quoted_predicate, args, 1)?;
        let mut sql = format!(
            "SELECT * FROM {} WHERE {predicate}",
            quote_identifier(entity.table_name)
        );

        let (order_by, limit) = match query.multiplicity {
            Multiplicity::One if query.quoted_order_by.is_empty() => {
                (format!("{} ASC", quote_identifier(entity.primary_key)), 1)
            }
            Multiplicity::One => (query.quoted_order_by.clone(), 1),
            Multiplicity::Many => (query.quoted_order_by.clone(), query.limit),
        };
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by);
        }
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(Self { sql, values })
    }
}

/// Rewrite every `?` in `fragment` into numbered parameters, starting at `$first`.
///
/// A list argument expands to one parameter per element (`$1, $2, $3`); an
/// empty list renders as `NULL` so that `IN (NULL)` matches nothing. Question
/// marks inside quoted literals or identifiers are left alone.
///
/// # Errors
///
/// [`CallError::Arity`] when the number of placeholders and arguments differ.
pub fn render_placeholders(
    fragment: &str,
    args: &[Arg],
    first: usize,
) -> Result<(String, Vec<Value>), CallError> {
    let expected = count_placeholders(fragment);
    if expected != args.len() {
        return Err(CallError::Arity {
            expected,
            actual: args.len(),
        });
    }

    let mut sql = String::with_capacity(fragment.len() + args.len() * 2);
    let mut values = Vec::with_capacity(args.len());
    let mut next = first;
    let mut args = args.iter();
    let mut quote: Option<char> = None;

    for c in fragment.chars() {
        match (c, quote) {
            ('\'' | '"', None) => {
                quote = Some(c);
                sql.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                sql.push(c);
            }
            ('?', None) => match args.next() {
                Some(Arg::Value(value)) => {
                    sql.push_str(&format!("${next}"));
                    values.push(value.clone());
                    next += 1;
                }
                Some(Arg::List(list)) if list.is_empty() => sql.push_str("NULL"),
                Some(Arg::List(list)) => {
                    let params: Vec<String> =
                        (next..next + list.len()).map(|n| format!("${n}")).collect();
                    sql.push_str(&params.join(", "));
                    values.extend(list.iter().cloned());
                    next += list.len();
                }
                None => {
                    return Err(CallError::Arity {
                        expected,
                        actual: values.len(),
                    })
                }
            },
            _ => sql.push(c),
        }
    }

    Ok((sql, values))
}

fn count_placeholders(fragment: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in fragment.chars() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('?', None) => count += 1,
            _ => {}
        }
    }
    count
}
