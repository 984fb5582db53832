//! Column and table names accepted by the renderer.
//!
//! Names are spliced into the SQL text, never bound, so only plain unquoted
//! identifiers are allowed. Field paths become columns by joining segments
//! with `_` (`address.city` is `address_city`), and the result must pass the
//! same check.

/// Postgres truncates identifiers longer than this.
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Whether `name` can be spliced into rendered SQL as a column or table.
///
/// ```
/// use keyseek::sql::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("address_city"));
/// assert!(!is_valid_sql_identifier("address.city"));
/// assert!(!is_valid_sql_identifier("id; DROP TABLE users"));
/// ```
#[must_use]
pub fn is_valid_sql_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    let head_ok = matches!(bytes.first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_');
    head_ok
        && bytes.len() <= MAX_IDENTIFIER_LENGTH
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

/// Reject a name configured on a [`SqlQuery`](super::SqlQuery).
///
/// # Panics
///
/// Panics when `name` fails [`is_valid_sql_identifier`]. Renderer names are
/// fixed in code; field paths from requests go through
/// [`SqlQuery::column_for`](super::SqlQuery::column_for) and fail with an error.
pub fn assert_valid_sql_identifier(name: &str, role: &str) {
    assert!(
        is_valid_sql_identifier(name),
        "{role} `{name}` cannot be used in rendered SQL: expected 1-{MAX_IDENTIFIER_LENGTH} \
         ASCII letters, digits or underscores, not starting with a digit"
    );
}
