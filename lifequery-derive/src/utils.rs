//! Utility functions for code generation

/// Convert an identifier to snake_case.
///
/// Follows the same word rule as `lifequery::query::case::to_column_name`, so a
/// field and the finder token that names it resolve to the same column: an
/// uppercase letter starts a word after a lowercase letter, or when it is the
/// last letter of an acronym run followed by lowercase (`URLAlias` ->
/// `url_alias`, `userID` -> `user_id`).
pub fn snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
