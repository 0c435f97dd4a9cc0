//! Allow-list matching for request paths.
//!
//! A pattern is an exact path, the catch-all `/*`, or a prefix wildcard
//! `<prefix>/*`. Patterns are tried in list order and the first match
//! wins; an empty list allows nothing.

const WILDCARD_SUFFIX: &str = "/*";

#[must_use]
pub fn is_path_allowed(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| pattern_matches(pattern, path))
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == WILDCARD_SUFFIX {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix(WILDCARD_SUFFIX) {
        if path.starts_with(prefix) {
            return true;
        }
    }
    pattern == path
}
