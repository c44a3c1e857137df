//! Identifier case conversion.
//!
//! Finder names spell fields in `PascalCase` (`CreatedAt`, `URLString`); storage
//! columns are `snake_case`. [`to_column_name`] bridges the two and is used for
//! every predicate and ordering field the parser extracts.

/// Convert a `PascalCase` field token into a `snake_case` column name.
///
/// A boundary is inserted before an uppercase character when the previous
/// character is lowercase, or when the next character is lowercase. The second
/// rule closes an acronym run before a new word starts, so `URLString` becomes
/// `url_string` rather than `u_r_l_string`.
///
/// # Examples
///
/// ```
/// use lifequery::query::case::to_column_name;
///
/// assert_eq!(to_column_name("UserName"), "user_name");
/// assert_eq!(to_column_name("URLString"), "url_string");
/// assert_eq!(to_column_name("ID"), "id");
/// ```
pub fn to_column_name(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut column = String::with_capacity(token.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                column.push('_');
            }
            column.extend(c.to_lowercase());
        } else {
            column.push(c);
        }
    }

    column
}
