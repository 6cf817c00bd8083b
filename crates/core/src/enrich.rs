//! Per-article orchestration.
//!
//! [`Enricher::enrich_article`] drives one article through detection,
//! generation, the five stages, the change check and persistence, and always
//! returns a report: failures are recorded, never propagated.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

use crate::article::{Article, ExternalEntityLink, GeneratedSummary, RelatedArticleRef, RelatedCandidate};
use crate::config::EnrichConfig;
use crate::detect::Detection;
use crate::generate::ContentGenerator;
use crate::markup::truncate_chars;
use crate::relevance::rank_candidates;
use crate::report::{EnrichmentReport, REASON_ALREADY_OPTIMIZED, REASON_TOO_SHORT};
use crate::stages::{
    append_related_section, convert_technical_lists, inject_entity_links, inject_internal_links, inject_summary_box,
};
use crate::store::ArticleStore;

/// Read-only context shared by every article of an invocation.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    pub related_pool: Vec<RelatedCandidate>,
    pub entities: Vec<ExternalEntityLink>,
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub min_length: usize,
    pub dry_run: bool,
}

/// Everything the stages need besides the body itself.
#[derive(Debug, Clone, Copy)]
pub struct StageInputs<'a> {
    pub detection: Detection,
    pub summary: Option<&'a GeneratedSummary>,
    pub candidates: &'a [RelatedCandidate],
    pub entities: &'a [ExternalEntityLink],
}

/// What the stage sequence did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub summary_box_added: bool,
    pub data_tables_created: usize,
    pub internal_links_added: usize,
    pub related_articles_section: bool,
    pub entity_links_added: usize,
}

/// Run the five stages in order, each gated on `inputs.detection`.
pub fn enrich_html(html: &str, inputs: &StageInputs<'_>, config: &EnrichConfig) -> (String, StageCounts) {
    let detection = &inputs.detection;
    let mut counts = StageCounts::default();
    let mut body = html.to_string();

    if !detection.has_summary_box
        && let Some(summary) = inputs.summary
    {
        body = inject_summary_box(&body, summary).html;
        counts.summary_box_added = true;
        tracing::debug!("summary box injected");
    }

    if !detection.has_data_table && detection.technical_lists > 0 {
        let rewrite = convert_technical_lists(&body);
        body = rewrite.html;
        counts.data_tables_created = rewrite.applied;
        tracing::debug!(tables = rewrite.applied, "technical lists converted");
    }

    if !detection.has_internal_links && !inputs.candidates.is_empty() {
        let rewrite = inject_internal_links(&body, inputs.candidates, config);
        body = rewrite.html;
        counts.internal_links_added = rewrite.applied;
        tracing::debug!(links = rewrite.applied, "internal links injected");
    }

    if !detection.has_related_section && !inputs.candidates.is_empty() {
        let targets: Vec<RelatedArticleRef> = inputs.candidates.iter().map(RelatedCandidate::as_ref_target).collect();
        let rewrite = append_related_section(&body, &targets, config);
        body = rewrite.html;
        counts.related_articles_section = rewrite.applied > 0;
        tracing::debug!(added = counts.related_articles_section, "related section built");
    }

    let rewrite = inject_entity_links(&body, inputs.entities, config);
    body = rewrite.html;
    counts.entity_links_added = rewrite.applied;
    tracing::debug!(links = rewrite.applied, "entity links injected");

    (body, counts)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// The per-article orchestrator.
pub struct Enricher<S, G> {
    config: EnrichConfig,
    store: S,
    generator: G,
}

impl<S: ArticleStore, G: ContentGenerator> Enricher<S, G> {
    pub fn new(config: EnrichConfig, store: S, generator: G) -> Self {
        Self { config, store, generator }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Enrich one article. Never fails: errors become an `error` report.
    #[tracing::instrument(skip_all, fields(article_id = %article.id, slug = %article.slug))]
    pub async fn enrich_article(
        &self, article: &Article, context: &SharedContext, options: RunOptions,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::for_article(article);

        if !article.is_eligible(options.min_length) {
            tracing::info!(length = report.original_length, min = options.min_length, "skipped: too short");
            return report.skipped(REASON_TOO_SHORT);
        }

        let detection = Detection::inspect(&article.content, &self.config.article_prefix);
        tracing::debug!(?detection, "detected existing enrichment");

        let summary = if detection.has_summary_box {
            None
        } else {
            let prefix = truncate_chars(&article.content, self.config.content_prefix_chars);
            self.generator.generate(&article.title, prefix).await
        };

        let candidates = rank_candidates(article, &context.related_pool, self.config.max_related_candidates);
        let inputs = StageInputs {
            detection,
            summary: summary.as_ref(),
            candidates: &candidates,
            entities: &context.entities,
        };

        let staged = catch_unwind(AssertUnwindSafe(|| enrich_html(&article.content, &inputs, &self.config)));
        let (content, counts) = match staged {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(error = %message, "enrichment stage failed");
                return report.failed(format!("enrichment stage failed: {message}"));
            }
        };

        report.summary_box_added = counts.summary_box_added;
        report.data_tables_created = counts.data_tables_created;
        report.internal_links_added = counts.internal_links_added;
        report.related_articles_section = counts.related_articles_section;
        report.entity_links_added = counts.entity_links_added;
        report.new_length = content.chars().count();

        if content == article.content {
            tracing::info!("skipped: already optimized");
            return report.skipped(REASON_ALREADY_OPTIMIZED);
        }

        if options.dry_run {
            tracing::info!(new_length = report.new_length, "dry run: changes not persisted");
            return report;
        }

        match self.store.update_content(&article.id, &content).await {
            Ok(()) => {
                tracing::info!(
                    original_length = report.original_length,
                    new_length = report.new_length,
                    "article enriched"
                );
                report
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist enriched content");
                report.failed(e.to_string())
            }
        }
    }
}
