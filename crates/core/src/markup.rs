//! Text-level HTML helpers shared by detection and the rewriting stages.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Attribute carried by the root element of every injected region.
pub const ENRICH_ATTR: &str = "data-enrich";

/// Spans that link injection must never write into: tag markup, existing
/// anchors, comments, script/style bodies and previously injected regions.
static PROTECTED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<aside\b[^>]*\bdata-enrich=[^>]*>.*?</aside\s*>|<section\b[^>]*\bdata-enrich=[^>]*>.*?</section\s*>|<table\b[^>]*\bdata-enrich=[^>]*>.*?</table\s*>|<a\b[^>]*>.*?</a\s*>|<!--.*?-->|<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>|<[^>]*>"#,
    )
    .expect("protected span pattern is valid")
});

/// Root-to-close spans of previously injected regions.
static INJECTED_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<aside\b[^>]*\bdata-enrich=[^>]*>.*?</aside\s*>|<section\b[^>]*\bdata-enrich=[^>]*>.*?</section\s*>|<table\b[^>]*\bdata-enrich=[^>]*>.*?</table\s*>"#,
    )
    .expect("injected region pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strip HTML tags from a string, keeping only text content
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").to_string()
}

/// Strip tags and collapse runs of whitespace.
pub fn text_of(html: &str) -> String {
    WHITESPACE.replace_all(strip_tags(html).trim(), " ").to_string()
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The first `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Byte ranges of regions injected by earlier enrichment runs.
pub fn injected_regions(html: &str) -> Vec<Range<usize>> {
    INJECTED_REGION.find_iter(html).map(|m| m.range()).collect()
}

/// Case-insensitive whole-term pattern for `term`.
///
/// Word boundaries are only asserted on sides where the term starts or ends
/// with a word character, so names like `PLA+` still match.
pub fn term_pattern(term: &str) -> Option<Regex> {
    let term = term.trim();
    let first = term.chars().next()?;
    let last = term.chars().last()?;

    let mut pattern = String::from("(?i)");
    if first.is_alphanumeric() {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(term));
    if last.is_alphanumeric() {
        pattern.push_str(r"\b");
    }

    Regex::new(&pattern).ok()
}

/// Byte range of the first match of `pattern` in linkable text.
///
/// Text inside tags, existing anchors and injected regions is skipped, so
/// wrapping the returned range in `<a>` can never produce a nested anchor.
/// A match that touches a tag is rejected when a word character sits on the
/// other side of it: `PETG<b>s</b>` is one word.
pub fn find_unlinked(html: &str, pattern: &Regex) -> Option<Range<usize>> {
    let spans = PROTECTED_SPAN.find_iter(html).map(|m| m.range()).chain(std::iter::once(html.len()..html.len()));

    let mut cursor = 0;
    let mut before = None;
    for span in spans {
        let text = &html[cursor..span.start];
        let after = html[span.end..].chars().next();
        let hit = pattern.find_iter(text).find(|m| {
            let glued_start = m.start() == 0 && starts_with_word(m.as_str()) && is_word(before);
            let glued_end = m.end() == text.len() && ends_with_word(m.as_str()) && is_word(after);
            !glued_start && !glued_end
        });
        if let Some(m) = hit {
            return Some(cursor + m.start()..cursor + m.end());
        }
        before = html[..span.start].chars().next_back();
        cursor = span.end;
    }
    None
}

fn is_word(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn starts_with_word(text: &str) -> bool {
    is_word(text.chars().next())
}

fn ends_with_word(text: &str) -> bool {
    is_word(text.chars().next_back())
}

/// Wrap `range` of `html` in the given opening tag and `</a>`.
pub fn wrap_in_anchor(html: &str, range: Range<usize>, open_tag: &str) -> String {
    let mut out = String::with_capacity(html.len() + open_tag.len() + 4);
    out.push_str(&html[..range.start]);
    out.push_str(open_tag);
    out.push_str(&html[range.clone()]);
    out.push_str("</a>");
    out.push_str(&html[range.end..]);
    out
}

/// Insert `fragment` before the last closing `</tag>`, case-insensitively.
pub fn insert_before_last_close(html: &str, tag: &str, fragment: &str) -> Option<String> {
    let close = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag))).ok()?;
    let last = close.find_iter(html).last()?;

    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..last.start()]);
    out.push_str(fragment);
    out.push_str(&html[last.start()..]);
    Some(out)
}

/// Count anchors nested inside another anchor. Zero for well-formed output.
pub fn nested_anchor_count(html: &str) -> usize {
    static ANCHOR_TAG: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<(/?)a\b[^>]*>").expect("anchor tag pattern is valid"));

    let mut depth = 0usize;
    let mut nested = 0;
    for caps in ANCHOR_TAG.captures_iter(html) {
        if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
            depth = depth.saturating_sub(1);
        } else {
            if depth > 0 {
                nested += 1;
            }
            depth += 1;
        }
    }
    nested
}
