//! Per-article outcome records and batch aggregation.

use serde::Serialize;

use crate::article::Article;

/// Skip reason for articles under the length threshold.
pub const REASON_TOO_SHORT: &str = "content too short";

/// Skip reason for articles where no stage changed anything.
pub const REASON_ALREADY_OPTIMIZED: &str = "already optimized";

/// Terminal state of one article run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Skipped,
    Error,
}

/// What the pipeline did to one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub article_id: String,
    pub title: String,
    pub slug: String,
    pub summary_box_added: bool,
    pub data_tables_created: usize,
    pub internal_links_added: usize,
    pub related_articles_section: bool,
    pub entity_links_added: usize,
    pub original_length: usize,
    pub new_length: usize,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentReport {
    /// A fresh report for `article`; lengths start equal and status is
    /// `success` until the run says otherwise.
    pub fn for_article(article: &Article) -> Self {
        let length = article.content_length();
        Self {
            article_id: article.id.clone(),
            title: article.title.clone(),
            slug: article.slug.clone(),
            summary_box_added: false,
            data_tables_created: 0,
            internal_links_added: 0,
            related_articles_section: false,
            entity_links_added: 0,
            original_length: length,
            new_length: length,
            status: ReportStatus::Success,
            reason: None,
            error: None,
        }
    }

    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.status = ReportStatus::Skipped;
        self.reason = Some(reason.into());
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = ReportStatus::Error;
        self.error = Some(error.into());
        self
    }

    /// Whether any stage fired.
    pub fn has_changes(&self) -> bool {
        self.summary_box_added
            || self.data_tables_created > 0
            || self.internal_links_added > 0
            || self.related_articles_section
            || self.entity_links_added > 0
    }
}

/// Aggregate counts over a run's reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[EnrichmentReport]) -> Self {
        reports.iter().fold(Self::default(), |mut summary, report| {
            summary.total += 1;
            match report.status {
                ReportStatus::Success => summary.enriched += 1,
                ReportStatus::Skipped => summary.skipped += 1,
                ReportStatus::Error => summary.errors += 1,
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article::new("42", "Resin safety", "resin-safety", "<p>gloves</p>")
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = EnrichmentReport::for_article(&article()).skipped(REASON_ALREADY_OPTIMIZED);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["articleId"], "42");
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "already optimized");
        assert_eq!(json["originalLength"], 13);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_has_changes() {
        let mut report = EnrichmentReport::for_article(&article());
        assert!(!report.has_changes());
        report.entity_links_added = 1;
        assert!(report.has_changes());
    }

    #[test]
    fn test_summary_counts() {
        let base = EnrichmentReport::for_article(&article());
        let reports = vec![
            base.clone(),
            base.clone().skipped(REASON_TOO_SHORT),
            base.clone().failed("write failed"),
            base,
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary, BatchSummary { total: 4, enriched: 2, skipped: 1, errors: 1 });
    }
}
