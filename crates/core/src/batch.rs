//! Invocation-level entry point: request parsing, article selection and
//! sequential processing.
//!
//! # Example
//!
//! ```rust
//! use gloss_core::{BatchRequest, BatchRunner, EnrichConfig, MemoryStore, NullGenerator};
//!
//! let request: BatchRequest = serde_json::from_str(r#"{"batchProcess": true, "dryRun": true}"#).unwrap();
//! assert!(request.batch_process);
//! assert_eq!(request.limit, None);
//!
//! let runner = BatchRunner::new(EnrichConfig::default(), MemoryStore::new(), NullGenerator);
//! assert_eq!(runner.store().write_count().unwrap(), 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::config::{Concurrency, EnrichConfig};
use crate::enrich::{Enricher, RunOptions, SharedContext};
use crate::generate::ContentGenerator;
use crate::report::{BatchSummary, EnrichmentReport};
use crate::store::ArticleStore;
use crate::{GlossError, Result};

/// One invocation. Either `article_id` or `batch_process` must be set.
///
/// `min_length` and `limit` fall back to [`EnrichConfig`] when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub article_id: Option<String>,
    #[serde(default)]
    pub batch_process: bool,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl BatchRequest {
    /// A request for a single article.
    pub fn single(article_id: impl Into<String>) -> Self {
        Self { article_id: Some(article_id.into()), ..Self::default() }
    }

    /// A request for the `limit` most recently modified articles.
    pub fn batch(limit: usize) -> Self {
        Self { batch_process: true, limit: Some(limit), ..Self::default() }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    fn options(&self, config: &EnrichConfig) -> RunOptions {
        RunOptions { min_length: self.min_length.unwrap_or(config.min_length), dry_run: self.dry_run }
    }
}

/// Result envelope of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub dry_run: bool,
    pub reports: Vec<EnrichmentReport>,
    pub summary: BatchSummary,
}

impl BatchResponse {
    fn new(dry_run: bool, reports: Vec<EnrichmentReport>) -> Self {
        let summary = BatchSummary::from_reports(&reports);
        Self { success: true, dry_run, reports, summary }
    }
}

/// Runs enrichment invocations against a store.
pub struct BatchRunner<S, G> {
    enricher: Enricher<S, G>,
}

impl<S: ArticleStore, G: ContentGenerator> BatchRunner<S, G> {
    pub fn new(config: EnrichConfig, store: S, generator: G) -> Self {
        Self { enricher: Enricher::new(config, store, generator) }
    }

    pub fn enricher(&self) -> &Enricher<S, G> {
        &self.enricher
    }

    pub fn store(&self) -> &S {
        self.enricher.store()
    }

    /// Select, enrich and report.
    ///
    /// Errors only for a malformed request, a missing single article, or a
    /// store failure while loading; per-article failures are reports.
    #[tracing::instrument(skip_all, fields(batch = request.batch_process, dry_run = request.dry_run))]
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let config = self.enricher.config();
        let options = request.options(config);
        let articles = self.select(request, options.min_length).await?;
        tracing::info!(count = articles.len(), "articles selected");

        let store = self.enricher.store();
        let context = SharedContext {
            related_pool: store.related_pool(config.related_pool_size).await?,
            entities: store.approved_entities().await?,
        };
        tracing::debug!(
            pool = context.related_pool.len(),
            entities = context.entities.len(),
            "shared context loaded"
        );

        let reports = match config.concurrency {
            Concurrency::Sequential => self.run_sequential(&articles, &context, options).await,
        };

        let response = BatchResponse::new(request.dry_run, reports);
        tracing::info!(
            total = response.summary.total,
            enriched = response.summary.enriched,
            skipped = response.summary.skipped,
            errors = response.summary.errors,
            "run complete"
        );
        Ok(response)
    }

    async fn select(&self, request: &BatchRequest, min_length: usize) -> Result<Vec<Article>> {
        let store = self.enricher.store();

        if let Some(id) = request.article_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return match store.get_article(id).await? {
                Some(article) => Ok(vec![article]),
                None => Err(GlossError::ArticleNotFound(id.to_string())),
            };
        }

        if request.batch_process {
            let limit = request.limit.unwrap_or(self.enricher.config().batch_limit);
            let recent = store.recent_articles(limit).await?;
            return Ok(recent.into_iter().filter(|a| a.is_eligible(min_length)).collect());
        }

        Err(GlossError::InvalidRequest("either articleId or batchProcess is required".to_string()))
    }

    async fn run_sequential(
        &self, articles: &[Article], context: &SharedContext, options: RunOptions,
    ) -> Vec<EnrichmentReport> {
        let mut reports = Vec::with_capacity(articles.len());
        for article in articles {
            reports.push(self.enricher.enrich_article(article, context, options).await);
        }
        reports
    }
}
