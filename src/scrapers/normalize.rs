//! Text normalization for scraped article text.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Characters that render as nothing but break length checks and keyword matching.
const INVISIBLE: &[char] = &['\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}'];

/// Collapse whitespace runs, drop zero-width characters, decode HTML entities, trim.
///
/// Pure and idempotent on already-clean text.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_invisible: String = text.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    let decoded = decode_html_entities(&without_invisible);
    WHITESPACE_RUN
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

/// Plain text of an HTML snippet (feed descriptions), normalized.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize_text("  a \n\n\t b   c  "), "a b c");
    }

    #[test]
    fn test_removes_zero_width_and_bom() {
        assert_eq!(normalize_text("\u{feff}인공\u{200b}지능"), "인공지능");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(normalize_text("R&amp;D &quot;AI&quot; &#39;x&#39;"), "R&D \"AI\" 'x'");
        assert_eq!(normalize_text("a&nbsp;b"), "a b");
    }

    #[test]
    fn test_keeps_angle_brackets() {
        assert_eq!(normalize_text("x < y &amp; y > z"), "x < y & y > z");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_text("  Hello&amp;  world \u{200b} ");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_strip_markup() {
        let html = r#"<a href="https://x">OpenAI ships <b>GPT</b></a>&nbsp;&nbsp;<font>News</font>"#;
        assert_eq!(strip_markup(html), "OpenAI ships GPT News");
    }
}
