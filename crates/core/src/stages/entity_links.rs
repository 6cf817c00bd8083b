use super::Rewrite;
use crate::article::ExternalEntityLink;
use crate::config::EnrichConfig;
use crate::markup::{escape_html, find_unlinked, term_pattern, wrap_in_anchor};

const ENTITY_MARKER: &str = r#"data-enrich="entity-link""#;

/// Link approved entities on their first unlinked mention.
///
/// Only the first `config.max_entity_candidates` entities are considered,
/// tried longest name first so a short name cannot claim text that belongs
/// to a longer one. Entity links left by an earlier run count toward
/// `config.max_entity_links`, and an entity whose URL is already linked is
/// skipped, so re-running the stage on its own output changes nothing.
pub fn inject_entity_links(html: &str, entities: &[ExternalEntityLink], config: &EnrichConfig) -> Rewrite {
    let existing = html.matches(ENTITY_MARKER).count();
    let budget = config.max_entity_links.saturating_sub(existing);
    if budget == 0 {
        return Rewrite::unchanged(html);
    }

    let mut candidates: Vec<&ExternalEntityLink> = entities.iter().take(config.max_entity_candidates).collect();
    candidates.sort_by_key(|e| std::cmp::Reverse(e.name.trim().chars().count()));

    let mut out = html.to_string();
    let mut added = 0;

    for entity in candidates {
        if added >= budget {
            break;
        }

        let href = escape_html(&entity.url);
        if entity.url.trim().is_empty() || out.contains(&format!(r#"href="{href}""#)) {
            continue;
        }
        let Some(pattern) = term_pattern(&entity.name) else {
            continue;
        };
        let Some(range) = find_unlinked(&out, &pattern) else {
            continue;
        };

        let title = entity
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| format!(r#" title="{}""#, escape_html(d.trim())))
            .unwrap_or_default();
        let open_tag = format!(
            r#"<a href="{href}" target="_blank" rel="noopener noreferrer" class="entity-link" {ENTITY_MARKER}{title}>"#
        );
        out = wrap_in_anchor(&out, range, &open_tag);
        added += 1;
    }

    Rewrite::new(out, added)
}
