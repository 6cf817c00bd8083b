use super::Rewrite;
use crate::article::RelatedArticleRef;
use crate::config::EnrichConfig;
use crate::markup::{escape_html, insert_before_last_close};

/// Closing tags the section is placed before, in order of preference.
const CONTAINER_TAGS: &[&str] = &["article", "body"];

/// Render the related-articles section. Empty when there are no targets.
pub fn render_related_section(targets: &[RelatedArticleRef], config: &EnrichConfig) -> String {
    let targets = &targets[..targets.len().min(config.related_section_size)];
    if targets.is_empty() {
        return String::new();
    }

    let mut section = String::from(r#"<section class="related-articles" data-enrich="related-articles">"#);
    section.push_str("<h2>Related Articles</h2>");
    section.push_str(r#"<ul data-enrich="related-list">"#);
    for target in targets {
        section.push_str(&format!(
            r#"<li><a href="{}">{}</a>"#,
            escape_html(&config.article_href(&target.slug)),
            escape_html(&target.title)
        ));
        if let Some(excerpt) = target.excerpt.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            section.push_str(&format!("<p>{}</p>", escape_html(excerpt)));
        }
        section.push_str("</li>");
    }
    section.push_str("</ul></section>");
    section
}

/// Add the related-articles section before the closing document container,
/// or at the end of the body when there is none.
pub fn append_related_section(html: &str, targets: &[RelatedArticleRef], config: &EnrichConfig) -> Rewrite {
    let section = render_related_section(targets, config);
    if section.is_empty() {
        return Rewrite::unchanged(html);
    }

    let placed = CONTAINER_TAGS.iter().find_map(|tag| insert_before_last_close(html, tag, &section));
    match placed {
        Some(out) => Rewrite::new(out, 1),
        None => Rewrite::new(format!("{html}\n{section}"), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(slug: &str, title: &str, excerpt: Option<&str>) -> RelatedArticleRef {
        RelatedArticleRef { slug: slug.to_string(), title: title.to_string(), excerpt: excerpt.map(String::from) }
    }

    fn targets(n: usize) -> Vec<RelatedArticleRef> {
        (0..n).map(|i| target(&format!("a-{i}"), &format!("Article {i}"), None)).collect()
    }

    #[test]
    fn test_render_caps_entries() {
        let section = render_related_section(&targets(6), &EnrichConfig::default());
        assert_eq!(section.matches("<li>").count(), 4);
        assert!(section.contains(r#"<a href="/kb/a-0">Article 0</a>"#));
        assert!(!section.contains("a-4"));
    }

    #[test]
    fn test_render_escapes_and_excerpt() {
        let section = render_related_section(
            &[target("tpu", "TPU & flex <filaments>", Some("  Soft prints.  "))],
            &EnrichConfig::default(),
        );
        assert!(section.contains("TPU &amp; flex &lt;filaments&gt;"));
        assert!(section.contains("<p>Soft prints.</p>"));
    }

    #[test]
    fn test_placed_before_closing_article() {
        let html = "<article><h1>T</h1><p>x</p></article><footer>f</footer>";
        let out = append_related_section(html, &targets(2), &EnrichConfig::default());
        assert_eq!(out.applied, 1);
        assert!(out.html.contains("</section></article><footer>"));
    }

    #[test]
    fn test_placed_before_body_close() {
        let html = "<body><p>x</p></body>";
        let out = append_related_section(html, &targets(1), &EnrichConfig::default());
        assert!(out.html.ends_with("</section></body>"));
    }

    #[test]
    fn test_appended_without_container() {
        let html = "<p>x</p>";
        let out = append_related_section(html, &targets(1), &EnrichConfig::default());
        assert!(out.html.starts_with("<p>x</p>\n<section"));
        assert!(out.html.ends_with("</section>"));
    }

    #[test]
    fn test_no_targets_unchanged() {
        let out = append_related_section("<p>x</p>", &[], &EnrichConfig::default());
        assert_eq!(out.applied, 0);
        assert_eq!(out.html, "<p>x</p>");
    }
}
