use std::sync::LazyLock;

use regex::Regex;

use super::Rewrite;
use crate::detect::technical_lists;
use crate::markup::text_of;

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").expect("list item pattern is valid"));

/// A dash only separates when surrounded by whitespace, so ranges such as
/// `200-220` stay intact.
static DASH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[-–—]\s").expect("dash separator pattern is valid"));

/// One table row derived from a list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub parameter: String,
    pub value: String,
}

impl ParameterRow {
    /// Whether the value carries a number.
    pub fn is_numeric(&self) -> bool {
        self.value.chars().any(|c| c.is_ascii_digit())
    }
}

/// Split an item on its first `:` or spaced dash.
pub fn split_item(text: &str) -> ParameterRow {
    let colon = text.find(':').map(|i| (i, i + 1));
    let dash = DASH_SEPARATOR.find(text).map(|m| (m.start(), m.end()));

    let separator = match (colon, dash) {
        (Some(c), Some(d)) => Some(if c.0 <= d.0 { c } else { d }),
        (c, d) => c.or(d),
    };

    match separator {
        Some((start, end)) => ParameterRow {
            parameter: text[..start].trim().to_string(),
            value: text[end..].trim().to_string(),
        },
        None => ParameterRow { parameter: text.trim().to_string(), value: String::new() },
    }
}

/// Rows for a list's inner HTML, skipping empty items.
pub fn list_rows(inner: &str) -> Vec<ParameterRow> {
    LIST_ITEM
        .captures_iter(inner)
        .filter_map(|caps| caps.get(1))
        .map(|m| text_of(m.as_str()))
        .filter(|text| !text.is_empty())
        .map(|text| split_item(&text))
        .collect()
}

/// Render rows as a technical table. Cell text is already HTML text, so it
/// is emitted as-is.
pub fn render_table(rows: &[ParameterRow]) -> String {
    let mut table = String::from(r#"<table class="technical-table" data-enrich="data-table">"#);
    table.push_str("<thead><tr><th>Parameter</th><th>Value</th><th>Numeric</th></tr></thead><tbody>");
    for row in rows {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.parameter,
            row.value,
            if row.is_numeric() { "Yes" } else { "No" }
        ));
    }
    table.push_str("</tbody></table>");
    table
}

/// Replace every technical list with a parameter table.
///
/// `applied` is the number of tables created. Technical lists with no
/// usable items are left in place.
pub fn convert_technical_lists(html: &str) -> Rewrite {
    let blocks = technical_lists(html);
    if blocks.is_empty() {
        return Rewrite::unchanged(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut created = 0;

    for block in blocks {
        let rows = list_rows(&block.inner);
        if rows.is_empty() {
            continue;
        }
        out.push_str(&html[cursor..block.range.start]);
        out.push_str(&render_table(&rows));
        cursor = block.range.end;
        created += 1;
    }
    out.push_str(&html[cursor..]);

    Rewrite::new(out, created)
}
