//! Whitespace normalization applied to the raw page before parsing

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\r?\n").expect("blank line pattern is valid"));

static INTER_TAG_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s*<").expect("inter-tag pattern is valid"));

/// Removes blank lines and collapses whitespace between adjacent tags
///
/// Text inside elements is left untouched, so `<a>ABC </a>` keeps its
/// trailing space; field extraction trims it later.
pub fn normalize_document(html: &str) -> String {
    let without_blank_lines = BLANK_LINE.replace_all(html, "");
    INTER_TAG_WHITESPACE
        .replace_all(&without_blank_lines, "><")
        .into_owned()
}
