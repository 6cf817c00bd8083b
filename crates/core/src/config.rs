//! Pipeline configuration.
//!
//! [`EnrichConfig`] is passed explicitly into the [`crate::Enricher`] and
//! [`crate::BatchRunner`]; nothing in the pipeline reads global state.
//!
//! # Example
//!
//! ```rust
//! use gloss_core::EnrichConfig;
//!
//! let config = EnrichConfig::builder()
//!     .min_length(3000)
//!     .article_prefix("/base/")
//!     .max_entity_links(3)
//!     .build();
//! assert_eq!(config.max_internal_links, 8);
//! ```

/// How the batch runner schedules articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// One article at a time, at most one generator call in flight.
    #[default]
    Sequential,
}

/// Configuration for the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Minimum content length (characters) for an article to be enriched (default: 5000).
    pub min_length: usize,

    /// Default number of recent articles selected in batch mode (default: 20).
    pub batch_limit: usize,

    /// Size of the shared related-article pool loaded per invocation (default: 100).
    pub related_pool_size: usize,

    /// Ranked candidates kept per article (default: 8).
    pub max_related_candidates: usize,

    /// Internal links inserted per article (default: 8).
    pub max_internal_links: usize,

    /// Minimum length of a title word used as internal-link anchor text (default: 5).
    pub min_link_word_len: usize,

    /// Entries in the related-articles section (default: 4).
    pub related_section_size: usize,

    /// Entity candidates considered per article (default: 10).
    pub max_entity_candidates: usize,

    /// Entity links present per article, including earlier runs (default: 5).
    pub max_entity_links: usize,

    /// Characters of article HTML sent to the generator (default: 3000).
    pub content_prefix_chars: usize,

    /// Path prefix of knowledge-base article URLs (default: `/kb/`).
    pub article_prefix: String,

    /// Batch scheduling policy.
    pub concurrency: Concurrency,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            min_length: 5000,
            batch_limit: 20,
            related_pool_size: 100,
            max_related_candidates: 8,
            max_internal_links: 8,
            min_link_word_len: 5,
            related_section_size: 4,
            max_entity_candidates: 10,
            max_entity_links: 5,
            content_prefix_chars: 3000,
            article_prefix: "/kb/".to_string(),
            concurrency: Concurrency::Sequential,
        }
    }
}

impl EnrichConfig {
    /// Creates a new builder for EnrichConfig.
    pub fn builder() -> EnrichConfigBuilder {
        EnrichConfigBuilder::new()
    }

    /// The public URL path of an article slug.
    pub fn article_href(&self, slug: &str) -> String {
        format!("{}{}", self.article_prefix, slug.trim_start_matches('/'))
    }
}

/// Builder for EnrichConfig.
pub struct EnrichConfigBuilder {
    config: EnrichConfig,
}

impl EnrichConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: EnrichConfig::default() }
    }

    /// Sets the minimum content length.
    pub fn min_length(mut self, value: usize) -> Self {
        self.config.min_length = value;
        self
    }

    /// Sets the default batch size.
    pub fn batch_limit(mut self, value: usize) -> Self {
        self.config.batch_limit = value;
        self
    }

    /// Sets the related pool size.
    pub fn related_pool_size(mut self, value: usize) -> Self {
        self.config.related_pool_size = value;
        self
    }

    /// Sets the number of ranked related candidates per article.
    pub fn max_related_candidates(mut self, value: usize) -> Self {
        self.config.max_related_candidates = value;
        self
    }

    /// Sets the internal link cap.
    pub fn max_internal_links(mut self, value: usize) -> Self {
        self.config.max_internal_links = value;
        self
    }

    /// Sets the minimum anchor word length.
    pub fn min_link_word_len(mut self, value: usize) -> Self {
        self.config.min_link_word_len = value;
        self
    }

    /// Sets the related section size.
    pub fn related_section_size(mut self, value: usize) -> Self {
        self.config.related_section_size = value;
        self
    }

    /// Sets the number of entity candidates.
    pub fn max_entity_candidates(mut self, value: usize) -> Self {
        self.config.max_entity_candidates = value;
        self
    }

    /// Sets the entity link cap.
    pub fn max_entity_links(mut self, value: usize) -> Self {
        self.config.max_entity_links = value;
        self
    }

    /// Sets how much content is sent to the generator.
    pub fn content_prefix_chars(mut self, value: usize) -> Self {
        self.config.content_prefix_chars = value;
        self
    }

    /// Sets the article URL prefix. A trailing slash is added if missing.
    pub fn article_prefix(mut self, value: impl Into<String>) -> Self {
        let mut prefix = value.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.config.article_prefix = prefix;
        self
    }

    /// Sets the batch scheduling policy.
    pub fn concurrency(mut self, value: Concurrency) -> Self {
        self.config.concurrency = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> EnrichConfig {
        self.config
    }
}

impl Default for EnrichConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
