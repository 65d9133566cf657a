//! Rendering of returned fields for display
//!
//! Backend snippets mark matches with `<em>` tags. Everything else in a
//! snippet or raw value is escaped so the result can be embedded as HTML.

use super::types::FieldValue;
use crate::query::ResultField;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::escape_html;

static HIGHLIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?em>").expect("highlight pattern is valid")
});

/// Decode the entities the backend uses when it escapes a snippet
fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}

/// Re-escape a backend snippet, keeping its `<em>` highlight markers.
///
/// Snippets arrive escaped already; they are decoded first so entities are
/// not escaped twice.
pub fn highlight_html(snippet: &str) -> String {
    let mut out = String::with_capacity(snippet.len());
    let mut last = 0;
    for m in HIGHLIGHT.find_iter(snippet) {
        out.push_str(&escape_html(&unescape_html(&snippet[last..m.start()])));
        out.push_str(if m.as_str().starts_with("</") { "</em>" } else { "<em>" });
        last = m.end();
    }
    out.push_str(&escape_html(&unescape_html(&snippet[last..])));
    out
}

/// Plain text of a snippet, without markers or entities
pub fn strip_highlight(snippet: &str) -> String {
    unescape_html(&HIGHLIGHT.replace_all(snippet, ""))
}

/// HTML for a field according to its snippet policy.
///
/// Prefers the snippet; falls back to the escaped raw value when the field
/// is raw-only or its snippet allows fallback. `None` means nothing to show.
pub fn display_html(value: &FieldValue, declaration: Option<&ResultField>) -> Option<String> {
    if let Some(snippet) = value.snippet.as_deref().filter(|s| !s.is_empty()) {
        return Some(highlight_html(snippet));
    }

    let show_raw = declaration.map(|d| d.shows_raw()).unwrap_or(true);
    if show_raw {
        value.raw_text().map(|text| escape_html(&text))
    } else {
        None
    }
}
