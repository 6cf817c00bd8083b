//! Ranking of related-article candidates for a subject article.

use std::collections::HashSet;

use crate::article::{Article, RelatedCandidate};

/// Score weight for sharing the subject's category.
const CATEGORY_WEIGHT: usize = 2;

/// Relevance of `candidate` to `article`: category match plus keyword overlap.
pub fn relevance(article: &Article, candidate: &RelatedCandidate) -> usize {
    let same_category = matches!(
        (&article.category_id, &candidate.category_id),
        (Some(a), Some(b)) if a == b
    );

    let subject: HashSet<String> = article.keywords.iter().map(|k| k.to_lowercase()).collect();
    let overlap = candidate
        .keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect::<HashSet<_>>()
        .intersection(&subject)
        .count();

    overlap + if same_category { CATEGORY_WEIGHT } else { 0 }
}

/// The `limit` most relevant candidates from the shared pool.
///
/// Candidates with no category or keyword in common are dropped, as is the
/// subject itself. Ties keep pool order.
pub fn rank_candidates(article: &Article, pool: &[RelatedCandidate], limit: usize) -> Vec<RelatedCandidate> {
    let mut scored: Vec<(usize, &RelatedCandidate)> = pool
        .iter()
        .filter(|c| c.id != article.id && c.slug != article.slug)
        .map(|c| (relevance(article, c), c))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, c)| c.clone()).collect()
}
