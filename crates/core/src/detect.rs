//! Presence checks for enrichment elements.
//!
//! Every stage tags the root of what it injects with `data-enrich="<kind>"`,
//! so "is X present" is a selector query over the parsed fragment rather
//! than a raw substring search. Legacy class names written by hand (or by
//! older tooling) are still recognised.
//!
//! # Example
//!
//! ```rust
//! use gloss_core::Detection;
//!
//! let html = r#"<h1>Nozzles</h1><ul><li>Diameter: 0.4 mm</li></ul>"#;
//! let detection = Detection::inspect(html, "/kb/");
//! assert!(!detection.has_summary_box);
//! assert_eq!(detection.technical_lists, 1);
//! ```

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::markup::{injected_regions, text_of};

static SUMMARY_BOX: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-enrich="summary-box"], .article-summary, .summary-box"#).expect("valid selector")
});

static DATA_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-enrich="data-table"], table.technical-table, table.data-table"#).expect("valid selector")
});

static INTERNAL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[data-enrich="internal-link"]"#).expect("valid selector"));

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

static RELATED_SECTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-enrich="related-articles"], .related-articles"#).expect("valid selector")
});

static SECTION_HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").expect("valid selector"));

/// An opening or closing `<ul>`/`<ol>` tag.
static LIST_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(ul|ol)(\s[^>]*)?>").expect("list tag pattern is valid"));

/// A number with an engineering unit, or a standards code.
static TECHNICAL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d+(?:[.,]\d+)?\s*(?:[°º]\s?[CF]\b|mm(?:/s|³/s|3/s)?\b|cm\b|µm\b|um\b|kg\b|g\b|mpa\b|gpa\b|w\b|v\b|(?-i:A)\b|rpm\b|min\b|ms\b|s\b|h\b|%)|\b(?-i:ISO|ASTM|DIN|EN|IEC|UL)\s?[A-Z]?\d{2,}",
    )
    .expect("technical value pattern is valid")
});

/// Which enrichment elements an article already carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub has_summary_box: bool,
    pub has_data_table: bool,
    pub has_internal_links: bool,
    pub has_related_section: bool,
    /// Lists that look like parameter listings and could become tables.
    pub technical_lists: usize,
}

impl Detection {
    /// Inspects an article body. `article_prefix` is the path prefix that
    /// identifies links to other knowledge-base articles.
    pub fn inspect(html: &str, article_prefix: &str) -> Self {
        let fragment = Html::parse_fragment(html);
        Self {
            has_summary_box: fragment.select(&SUMMARY_BOX).next().is_some(),
            has_data_table: fragment.select(&DATA_TABLE).next().is_some(),
            has_internal_links: internal_links_in(&fragment, article_prefix),
            has_related_section: related_section_in(&fragment),
            technical_lists: technical_lists(html).len(),
        }
    }

    /// Whether every gated stage would be skipped.
    pub fn is_fully_enriched(&self) -> bool {
        self.has_summary_box && self.has_data_table && self.has_internal_links && self.has_related_section
    }
}

/// Whether the article already has a summary box.
pub fn has_summary_box(html: &str) -> bool {
    Html::parse_fragment(html).select(&SUMMARY_BOX).next().is_some()
}

/// Whether the article already has a data table.
pub fn has_data_table(html: &str) -> bool {
    Html::parse_fragment(html).select(&DATA_TABLE).next().is_some()
}

/// Whether the article already links to other knowledge-base articles.
pub fn has_internal_links(html: &str, article_prefix: &str) -> bool {
    internal_links_in(&Html::parse_fragment(html), article_prefix)
}

/// Whether the article already has a related-articles section.
pub fn has_related_section(html: &str) -> bool {
    related_section_in(&Html::parse_fragment(html))
}

fn internal_links_in(fragment: &Html, article_prefix: &str) -> bool {
    if fragment.select(&INTERNAL_LINK).next().is_some() {
        return true;
    }
    !article_prefix.is_empty()
        && fragment
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .any(|href| href.starts_with(article_prefix))
}

fn related_section_in(fragment: &Html) -> bool {
    if fragment.select(&RELATED_SECTION).next().is_some() {
        return true;
    }
    fragment
        .select(&SECTION_HEADING)
        .map(|h: ElementRef| h.text().collect::<String>().to_lowercase())
        .any(|text| text.contains("related articles"))
}

/// Whether list text reads like a parameter listing.
pub fn is_technical(text: &str) -> bool {
    TECHNICAL_VALUE.is_match(text)
}

/// A `<ul>`/`<ol>` block located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBlock {
    /// Byte range of the whole element, open tag to close tag.
    pub range: Range<usize>,
    /// Attribute text of the opening tag.
    pub attrs: String,
    /// Inner HTML between the tags.
    pub inner: String,
}

struct OpenList {
    name: String,
    start: usize,
    inner_start: usize,
    attrs: Range<usize>,
    nested: bool,
}

/// Top-level lists with no list nested inside them, in document order.
///
/// Tags are matched by depth, so a nested list never ends its parent. Lists
/// that nest are left out entirely: their items do not map onto table rows.
pub fn flat_lists(html: &str) -> Vec<ListBlock> {
    let mut stack: Vec<OpenList> = Vec::new();
    let mut blocks = Vec::new();

    for caps in LIST_TAG.captures_iter(html) {
        let (Some(tag), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();

        if caps.get(1).is_some_and(|m| m.is_empty()) {
            if let Some(root) = stack.first_mut() {
                root.nested = true;
            }
            let attrs = caps.get(3).map_or(tag.end()..tag.end(), |m| m.range());
            stack.push(OpenList { name, start: tag.start(), inner_start: tag.end(), attrs, nested: false });
            continue;
        }

        // Stray closing tags are ignored; unclosed children close with their parent.
        let Some(depth) = stack.iter().rposition(|open| open.name == name) else {
            continue;
        };
        stack.truncate(depth + 1);
        let Some(open) = stack.pop() else {
            continue;
        };
        if !stack.is_empty() || open.nested {
            continue;
        }

        blocks.push(ListBlock {
            range: open.start..tag.end(),
            attrs: html[open.attrs].to_string(),
            inner: html[open.inner_start..tag.start()].to_string(),
        });
    }

    blocks
}

/// Technical list blocks, in document order.
///
/// Lists carrying a `data-enrich` attribute, or sitting inside a region
/// injected by an earlier run, are never technical.
pub fn technical_lists(html: &str) -> Vec<ListBlock> {
    let injected = injected_regions(html);
    flat_lists(html)
        .into_iter()
        .filter(|block| {
            !block.attrs.contains("data-enrich")
                && !injected.iter().any(|r| r.contains(&block.range.start))
                && is_technical(&text_of(&block.inner))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"<aside class="article-summary" data-enrich="summary-box"><p>x</p></aside>"#, true)]
    #[case(r#"<div class="summary-box">Legacy</div>"#, true)]
    #[case(r#"<div class="summary">Not the marker</div>"#, false)]
    #[case(r#"<p>A summary box is mentioned in prose only.</p>"#, false)]
    fn test_has_summary_box(#[case] html: &str, #[case] expected: bool) {
        assert_eq!(has_summary_box(html), expected);
    }

    #[rstest]
    #[case(r#"<table class="technical-table" data-enrich="data-table"></table>"#, true)]
    #[case(r#"<table class="data-table"><tr><td>1</td></tr></table>"#, true)]
    #[case(r#"<table><tr><td>layout</td></tr></table>"#, false)]
    fn test_has_data_table(#[case] html: &str, #[case] expected: bool) {
        assert_eq!(has_data_table(html), expected);
    }

    #[rstest]
    #[case(r#"<p><a href="/kb/bed-leveling">bed</a></p>"#, true)]
    #[case(r#"<p><a class="internal-link" data-enrich="internal-link" href="/x">x</a></p>"#, true)]
    #[case(r#"<p><a href="https://example.com/kb/x">external</a></p>"#, false)]
    #[case(r#"<p>No links at all</p>"#, false)]
    fn test_has_internal_links(#[case] html: &str, #[case] expected: bool) {
        assert_eq!(has_internal_links(html, "/kb/"), expected);
    }

    #[rstest]
    #[case(r#"<section data-enrich="related-articles"></section>"#, true)]
    #[case(r#"<div class="related-articles"></div>"#, true)]
    #[case(r#"<h2>Related Articles</h2><ul><li>x</li></ul>"#, true)]
    #[case(r#"<h2>Related work</h2>"#, false)]
    fn test_has_related_section(#[case] html: &str, #[case] expected: bool) {
        assert_eq!(has_related_section(html), expected);
    }

    #[rstest]
    #[case("Nozzle temperature: 210 °C", true)]
    #[case("Print speed - 60mm/s", true)]
    #[case("Infill 20%", true)]
    #[case("Tensile test per ASTM D638", true)]
    #[case("Layer height 0.2 mm", true)]
    #[case("Print time: 5 h", true)]
    #[case("Current: 2 A", true)]
    #[case("Heater power: 40 W", true)]
    #[case("Plan a 2 a.m. print", false)]
    #[case("Use a glue stick on glass", false)]
    #[case("Step 2 of the guide", false)]
    fn test_is_technical(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_technical(text), expected);
    }

    #[test]
    fn test_technical_lists_in_order() {
        let html = r#"
            <ol><li>Nozzle: 0.4 mm</li></ol>
            <ul><li>Clean the bed</li></ul>
            <ul class="specs"><li>Bed: 60 °C</li><li>Fan: 100%</li></ul>
        "#;
        let blocks = technical_lists(html);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].inner.contains("Nozzle"));
        assert!(blocks[1].inner.contains("Bed"));
        assert!(blocks[0].range.start < blocks[1].range.start);
    }

    #[test]
    fn test_flat_lists_match_tags_by_depth() {
        let html = "<ul><li>Hotend<ul><li>Nozzle: 0.4 mm</li></ul></li><li>Bed: 60 °C</li></ul>\
                    <OL class=\"steps\"><li>Fan: 100%</li></OL>";
        let blocks = flat_lists(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].inner, "<li>Fan: 100%</li>");
        assert_eq!(blocks[0].attrs, r#" class="steps""#);
        assert!(html[blocks[0].range.clone()].ends_with("</OL>"));
    }

    #[test]
    fn test_nested_lists_are_not_technical() {
        let html = "<ul><li>Hotend<ul><li>Nozzle: 0.4 mm</li></ul></li><li>Bed: 60 °C</li></ul><p>after</p>";
        assert!(technical_lists(html).is_empty());
        assert_eq!(Detection::inspect(html, "/kb/").technical_lists, 0);
    }

    #[test]
    fn test_technical_lists_skip_injected() {
        let html = r#"
            <section class="related-articles" data-enrich="related-articles"><h2>Related Articles</h2>
            <ul data-enrich="related-list"><li><a href="/kb/a">Printing at 0.1 mm layers</a></li></ul></section>
            <aside data-enrich="summary-box"><ul><li>Speed: 40 mm/s</li></ul></aside>
        "#;
        assert!(technical_lists(html).is_empty());
    }

    #[test]
    fn test_inspect_fully_enriched() {
        let html = r#"
            <aside class="article-summary" data-enrich="summary-box"></aside>
            <table class="technical-table" data-enrich="data-table"></table>
            <p><a class="internal-link" data-enrich="internal-link" href="/kb/a">a</a></p>
            <section class="related-articles" data-enrich="related-articles"></section>
        "#;
        let detection = Detection::inspect(html, "/kb/");
        assert!(detection.is_fully_enriched());
        assert_eq!(detection.technical_lists, 0);
    }
}
