//! Read-only gate for model-generated queries.
//!
//! A query is rejected when it contains a write keyword as a whole word (case-insensitive),
//! a CozoScript mutation directive such as `:put` or `:rm`, or any `::` system operation.
//! Queries that pass are still executed with [`cozo::ScriptMutability::Immutable`].

use lazy_static::lazy_static;
use regex::Regex;

use crate::DbError;

/// Write keywords that disqualify a query wherever they appear as a whole word.
pub const FORBIDDEN_KEYWORDS: &[&str] = &["create", "delete", "set", "merge", "remove", "drop"];

/// CozoScript directives that write to a stored relation.
pub const FORBIDDEN_DIRECTIVES: &[&str] = &[
    "put",
    "rm",
    "replace",
    "insert",
    "update",
    "ensure",
    "ensure_not",
];

lazy_static! {
    static ref KEYWORD_RE: Regex = Regex::new(&format!(
        r"(?i)\b({})\b",
        FORBIDDEN_KEYWORDS.join("|")
    ))
    .expect("keyword pattern is valid");
    static ref DIRECTIVE_RE: Regex = Regex::new(&format!(
        r"(?i)(?:^|[^\w:]):({})\b",
        FORBIDDEN_DIRECTIVES.join("|")
    ))
    .expect("directive pattern is valid");
    static ref SYSTEM_OP_RE: Regex =
        Regex::new(r"(?:^|[^\w:])(::\w*)").expect("system op pattern is valid");
}

/// Returns `Err(DbError::UnsafeQuery)` naming the first offending keyword, or `Ok(())` for a
/// query that looks read-only.
pub fn validate_read_only(query: &str) -> Result<(), DbError> {
    let mut hits: Vec<(usize, String)> = Vec::new();
    if let Some(c) = KEYWORD_RE.captures(query) {
        let m = c.get(1).map(|m| (m.start(), m.as_str().to_ascii_lowercase()));
        hits.extend(m);
    }
    if let Some(c) = DIRECTIVE_RE.captures(query) {
        let m = c
            .get(1)
            .map(|m| (m.start(), format!(":{}", m.as_str().to_ascii_lowercase())));
        hits.extend(m);
    }
    if let Some(c) = SYSTEM_OP_RE.captures(query) {
        let m = c.get(1).map(|m| (m.start(), m.as_str().to_string()));
        hits.extend(m);
    }
    match hits.into_iter().min_by_key(|(pos, _)| *pos) {
        Some((_, keyword)) => {
            tracing::warn!(%keyword, "rejected mutating query");
            Err(DbError::UnsafeQuery { keyword })
        }
        None => Ok(()),
    }
}
