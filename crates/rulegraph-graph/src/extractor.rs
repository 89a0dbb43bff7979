//! Dependency inference from rule expressions.
//!
//! This is pattern scanning, not parsing. Rule names follow a mixed-case
//! convention (`BaseSalary`, `Bonus2024`), built-in functions are ALL-CAPS
//! (`ROUND`, `MAX`, `TBL`) and lookup-table keys are double-quoted strings.
//! Anything outside that convention may be under- or over-matched.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Double-quoted literal, e.g. the table name in `TBL("Grades", Level)`.
static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*""#).expect("quoted literal pattern is valid"));

/// Uppercase first letter followed by at least one lowercase letter.
static MIXED_CASE_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z0-9_]*[a-z][A-Za-z0-9_]*\b")
        .expect("mixed-case identifier pattern is valid")
});

/// Blank out quoted literals so their contents never look like references.
///
/// Each literal is replaced with a single space so the tokens on either side
/// stay separated.
pub fn strip_quoted_literals(expression: &str) -> String {
    QUOTED_LITERAL.replace_all(expression, " ").into_owned()
}

/// Every mixed-case token in `expression`, quoted literals excluded, in order
/// of first appearance. Repeated tokens are reported once.
pub fn candidate_tokens(expression: &str) -> Vec<String> {
    let stripped = strip_quoted_literals(expression);
    let mut seen = HashSet::new();
    MIXED_CASE_IDENT
        .find_iter(&stripped)
        .map(|m| m.as_str())
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// Names of other known rules that `expression` reads.
///
/// A rule never depends on itself through its own expression.
pub fn extract_references(
    expression: &str,
    known_names: &HashSet<String>,
    self_name: &str,
) -> BTreeSet<String> {
    candidate_tokens(expression)
        .into_iter()
        .filter(|token| token != self_name && known_names.contains(token))
        .collect()
}
