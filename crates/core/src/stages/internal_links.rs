use super::Rewrite;
use crate::article::RelatedCandidate;
use crate::config::EnrichConfig;
use crate::markup::{escape_html, find_unlinked, term_pattern, wrap_in_anchor};

/// Title words long enough to serve as anchor text, in title order.
pub fn significant_words(title: &str, min_len: usize) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in title.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() >= min_len && !words.iter().any(|w| w.eq_ignore_ascii_case(word)) {
            words.push(word.to_string());
        }
    }
    words
}

/// Link the body to related articles.
///
/// Each candidate gets at most one link, placed on the first unlinked
/// occurrence of the first of its title words that appears in the body.
/// Stops after `config.max_internal_links` insertions.
pub fn inject_internal_links(html: &str, candidates: &[RelatedCandidate], config: &EnrichConfig) -> Rewrite {
    let mut out = html.to_string();
    let mut added = 0;

    for candidate in candidates {
        if added >= config.max_internal_links {
            break;
        }

        for word in significant_words(&candidate.title, config.min_link_word_len) {
            let Some(pattern) = term_pattern(&word) else {
                continue;
            };
            let Some(range) = find_unlinked(&out, &pattern) else {
                continue;
            };

            let open_tag = format!(
                r#"<a href="{}" class="internal-link" data-enrich="internal-link" title="{}">"#,
                escape_html(&config.article_href(&candidate.slug)),
                escape_html(&candidate.title)
            );
            out = wrap_in_anchor(&out, range, &open_tag);
            added += 1;
            break;
        }
    }

    Rewrite::new(out, added)
}
