//! Minimal HTML text helpers for the scraping backends.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

/// Strip tags, decode entities and collapse whitespace.
#[must_use]
pub fn text_content(fragment: &str) -> String {
    let stripped = tag_pattern().replace_all(fragment, " ");
    html_escape::decode_html_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
