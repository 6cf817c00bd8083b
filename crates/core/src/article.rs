//! Article data model consumed and produced by the pipeline.
//!
//! [`Article`] is the only record the pipeline writes back, and only its
//! `content` field. Everything else here is read-only shared context.

use serde::{Deserialize, Serialize};

/// A knowledge-base article as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Store identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// URL slug, relative to the article path prefix.
    pub slug: String,

    /// Category reference, if the article is categorised.
    #[serde(default)]
    pub category_id: Option<String>,

    /// Keyword set. Unordered; duplicates are dropped by [`Article::with_keywords`].
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Rich-text HTML body.
    pub content: String,

    /// Short teaser used when this article is listed as related.
    #[serde(default)]
    pub excerpt: Option<String>,
}

impl Article {
    /// Creates an article with no category, keywords or excerpt.
    pub fn new(
        id: impl Into<String>, title: impl Into<String>, slug: impl Into<String>, content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slug: slug.into(),
            category_id: None,
            keywords: Vec::new(),
            content: content.into(),
            excerpt: None,
        }
    }

    /// Sets the category reference.
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Sets the keyword set, dropping case-insensitive duplicates.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = dedup_keywords(keywords.into_iter().map(Into::into));
        self
    }

    /// Sets the excerpt.
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Content length in characters, as used by the eligibility threshold.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Whether the content is long enough to be enriched.
    pub fn is_eligible(&self, min_length: usize) -> bool {
        self.content_length() >= min_length
    }

    /// Projects this article into a related-article candidate.
    pub fn as_candidate(&self) -> RelatedCandidate {
        RelatedCandidate {
            id: self.id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            category_id: self.category_id.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

/// Drops empty and case-insensitively repeated keywords, keeping first spelling.
pub fn dedup_keywords(keywords: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
        .collect()
}

/// An entry of the shared related-article pool.
///
/// Carries category and keywords so candidates can be ranked against a
/// subject article; only [`RelatedArticleRef`] fields end up in markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedCandidate {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl RelatedCandidate {
    /// The link/section target view of this candidate.
    pub fn as_ref_target(&self) -> RelatedArticleRef {
        RelatedArticleRef { slug: self.slug.clone(), title: self.title.clone(), excerpt: self.excerpt.clone() }
    }
}

/// A related article as rendered into links and the related section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArticleRef {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
}

/// A moderated, pre-approved outbound authority link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEntityLink {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExternalEntityLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into(), description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A generated label/value pair shown in the summary box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickFact {
    pub label: String,
    pub value: String,
}

impl QuickFact {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

/// Maximum number of quick facts kept from a generated summary.
pub const MAX_QUICK_FACTS: usize = 4;

/// Structured result of the content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSummary {
    pub summary: String,
    pub quick_facts: Vec<QuickFact>,
}

impl GeneratedSummary {
    /// Builds a summary, keeping at most [`MAX_QUICK_FACTS`] facts.
    pub fn new(summary: impl Into<String>, mut quick_facts: Vec<QuickFact>) -> Self {
        quick_facts.truncate(MAX_QUICK_FACTS);
        Self { summary: summary.into(), quick_facts }
    }
}
