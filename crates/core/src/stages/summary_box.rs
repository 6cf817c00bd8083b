use std::cell::Cell;

use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, element};

use super::Rewrite;
use crate::article::GeneratedSummary;
use crate::markup::escape_html;

/// Render the summary box for a generated summary.
pub fn render_summary_box(summary: &GeneratedSummary) -> String {
    let mut block = String::from(r#"<aside class="article-summary" data-enrich="summary-box">"#);
    block.push_str(r#"<p class="article-summary__title"><strong>Quick summary</strong></p>"#);
    block.push_str(&format!(r#"<p class="article-summary__text">{}</p>"#, escape_html(&summary.summary)));

    if !summary.quick_facts.is_empty() {
        block.push_str(r#"<dl class="article-summary__facts">"#);
        for fact in &summary.quick_facts {
            block.push_str(&format!(
                "<div><dt>{}</dt><dd>{}</dd></div>",
                escape_html(&fact.label),
                escape_html(&fact.value)
            ));
        }
        block.push_str("</dl>");
    }

    block.push_str("</aside>");
    block
}

/// Insert the summary box right after the first `<h1>`, else the first
/// `<h2>`, else at the very top of the body.
pub fn inject_summary_box(html: &str, summary: &GeneratedSummary) -> Rewrite {
    let block = render_summary_box(summary);

    let inserted = ["h1", "h2"].into_iter().find_map(|tag| insert_after_first(html, tag, &block));
    match inserted {
        Some(out) => Rewrite::new(out, 1),
        None => Rewrite::new(format!("{block}{html}"), 1),
    }
}

/// Stream the body through lol_html, placing `block` after the end tag of
/// the first `tag` element. `None` if the element was never seen or the
/// rewriter failed.
fn insert_after_first(html: &str, tag: &str, block: &str) -> Option<String> {
    let done = Cell::new(false);
    let mut output = Vec::with_capacity(html.len() + block.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!(tag, |el| {
                if !done.get() {
                    el.after(block, ContentType::Html);
                    done.set(true);
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).ok()?;
    rewriter.end().ok()?;

    if !done.get() {
        return None;
    }
    String::from_utf8(output).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::QuickFact;

    fn summary() -> GeneratedSummary {
        GeneratedSummary::new(
            "PETG needs <b>more</b> heat & a slower fan.",
            vec![QuickFact::new("Nozzle", "240 °C"), QuickFact::new("Bed", "80 °C")],
        )
    }

    #[test]
    fn test_render_escapes_text() {
        let block = render_summary_box(&summary());
        assert!(block.starts_with(r#"<aside class="article-summary" data-enrich="summary-box">"#));
        assert!(block.contains("needs &lt;b&gt;more&lt;/b&gt; heat &amp; a slower fan."));
        assert_eq!(block.matches("<dt>").count(), 2);
    }

    #[test]
    fn test_render_without_facts_omits_list() {
        let block = render_summary_box(&GeneratedSummary::new("Short.", vec![]));
        assert!(!block.contains("<dl"));
    }

    #[test]
    fn test_inserted_after_first_h1() {
        let html = "<h1>PETG guide</h1><p>Intro</p><h1>Second</h1>";
        let out = inject_summary_box(html, &summary());
        assert_eq!(out.applied, 1);
        assert!(out.html.starts_with("<h1>PETG guide</h1><aside"));
        assert_eq!(out.html.matches("data-enrich=\"summary-box\"").count(), 1);
        assert!(out.html.ends_with("<p>Intro</p><h1>Second</h1>"));
    }

    #[test]
    fn test_falls_back_to_first_h2() {
        let html = "<p>Lead</p><h2 id=\"setup\">Setup</h2><p>Body</p><h2>More</h2>";
        let out = inject_summary_box(html, &summary());
        let box_at = out.html.find("<aside").unwrap();
        assert!(box_at > out.html.find("</h2>").unwrap());
        assert!(box_at < out.html.find("<p>Body</p>").unwrap());
    }

    #[test]
    fn test_commented_out_h1_is_not_a_heading() {
        let html = "<!-- <h1>old</h1> --><p>Lead</p><h2>Setup</h2><p>Body</p>";
        let out = inject_summary_box(html, &summary());
        assert!(out.html.starts_with("<!-- <h1>old</h1> --><p>Lead</p><h2>Setup</h2><aside"));
        assert!(out.html.ends_with("</aside><p>Body</p>"));
    }

    #[test]
    fn test_prepends_without_headings() {
        let html = "<p>Only paragraphs about ºC</p>";
        let out = inject_summary_box(html, &summary());
        assert!(out.html.starts_with("<aside"));
        assert!(out.html.ends_with(html));
    }

    #[test]
    fn test_preserves_rest_of_document() {
        let html = "<h1 class=\"title\">Título</h1>\n<p>Temperatura: 210 ºC</p>";
        let out = inject_summary_box(html, &summary());
        assert!(out.html.contains("<h1 class=\"title\">Título</h1>"));
        assert!(out.html.contains("<p>Temperatura: 210 ºC</p>"));
    }
}
