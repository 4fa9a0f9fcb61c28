//! String transformation utilities for descriptor generation

use heck::{ToLowerCamelCase, ToShoutySnakeCase};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Convert a string to SCREAMING_SNAKE_CASE, the form used for environment variable names
pub fn to_screaming_snake_case(s: &str) -> String {
    s.to_shouty_snake_case()
}

/// Convert a string to lowerCamelCase
pub fn to_lower_camel_case(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Collapse runs of whitespace (newlines included) into single spaces
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Shorten `text` to at most `limit` characters, cutting on a word boundary and
/// appending `...` when anything was removed.
pub fn truncate_words(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let prefix: String = text.chars().take(limit).collect();
    let splits_word = text
        .chars()
        .nth(limit)
        .is_some_and(|next| next.is_alphanumeric())
        && prefix.chars().last().is_some_and(|c| c.is_alphanumeric());

    let kept = if splits_word {
        let pruned = prefix.trim_end_matches(|c: char| !c.is_whitespace()).trim_end();
        if pruned.is_empty() {
            prefix.as_str()
        } else {
            pruned
        }
    } else {
        prefix.trim_end()
    };

    format!("{kept}...")
}
