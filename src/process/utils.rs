// src/process/utils.rs

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Trim and collapse every whitespace run to a single space.
pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Property label → column key: lower-case, whitespace runs become `_`.
pub fn normalize_key(label: &str) -> String {
    WHITESPACE
        .replace_all(label.trim(), "_")
        .to_lowercase()
}

/// Strip `prefix` from the start of `s`, ignoring ASCII case.
pub fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Strip `suffix` from the end of `s`, ignoring ASCII case.
pub fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let start = s.len().checked_sub(suffix.len())?;
    let tail = s.get(start..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..start])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_lowercased_and_underscored() {
        assert_eq!(normalize_key("Current as of"), "current_as_of");
        assert_eq!(normalize_key("  Percent of   Perimeter\tContained "), "percent_of_perimeter_contained");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("  Oak\n   Fire "), "Oak Fire");
    }

    #[test]
    fn case_insensitive_affixes() {
        assert_eq!(strip_prefix_ci("Approx. 2020-08-01", "approx. "), Some("2020-08-01"));
        assert_eq!(strip_prefix_ci("2020", "approx. "), None);
        assert_eq!(strip_suffix_ci("1,234 acres", " Acres"), Some("1,234"));
        assert_eq!(strip_suffix_ci("é", " Acres"), None);
    }
}
