//! End-to-end pipeline tests over the in-memory store
use std::sync::atomic::{AtomicUsize, Ordering};

use gloss_core::markup::nested_anchor_count;
use gloss_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture_article() -> Article {
    let html = std::fs::read_to_string(get_fixture_path("article.html")).unwrap();
    Article::new("petg", "Printing PETG Without Stringing", "petg-stringing", html)
        .with_category("materials")
        .with_keywords(["PETG", "stringing", "retraction"])
}

fn candidate(id: &str, title: &str, keywords: &[&str]) -> Article {
    Article::new(id, title, id, format!("<p>{title}</p>"))
        .with_category("materials")
        .with_keywords(keywords.iter().copied())
        .with_excerpt(format!("All about {}", title.to_lowercase()))
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(candidate("retraction-tuning", "Retraction Tuning Guide", &["retraction"])).unwrap();
    store.insert(candidate("bed-adhesion", "Bed Adhesion Basics", &[])).unwrap();
    store.insert(candidate("filament-drying", "Filament Drying at Home", &["PETG"])).unwrap();
    store.insert(fixture_article()).unwrap();
    store
}

/// Replies like a chat model would: prose around a JSON object.
struct ScriptedGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(facts: usize) -> Self {
        let facts: Vec<String> =
            (0..facts).map(|i| format!(r#"{{"label":"Fact {i}","value":"{} mm"}}"#, i + 1)).collect();
        let reply = format!(
            r#"Here you go: {{"summary":"PETG strings when it oozes during travel.","quickFacts":[{}]}} Hope that helps."#,
            facts.join(",")
        );
        Self { reply, calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, _title: &str, content: &str) -> Option<GeneratedSummary> {
        assert!(content.chars().count() <= 3000);
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_reply(&self.reply)
    }
}

impl ContentGenerator for &ScriptedGenerator {
    async fn generate(&self, title: &str, content: &str) -> Option<GeneratedSummary> {
        (**self).generate(title, content).await
    }
}

fn stored_content(runner: &BatchRunner<MemoryStore, impl ContentGenerator>, id: &str) -> String {
    runner.store().article(id).unwrap().unwrap().content
}

#[tokio::test]
async fn test_full_enrichment_of_technical_article() {
    let runner = BatchRunner::new(EnrichConfig::default(), seeded_store(), ScriptedGenerator::new(3));
    let response = runner.run(&BatchRequest::single("petg")).await.unwrap();

    assert!(response.success);
    assert_eq!(response.reports.len(), 1);
    let report = &response.reports[0];
    assert_eq!(report.status, ReportStatus::Success);
    assert!(report.summary_box_added);
    assert_eq!(report.data_tables_created, 2);
    assert!(report.internal_links_added > 0 && report.internal_links_added <= 3);
    assert!(report.related_articles_section);
    assert!(report.new_length > report.original_length);

    let content = stored_content(&runner, "petg");
    assert_eq!(content.chars().count(), report.new_length);
    assert_eq!(content.matches(r#"data-enrich="data-table""#).count(), 2);
    assert_eq!(content.matches("<dt>").count(), 3);

    let h1_end = content.find("</h1>").unwrap();
    let summary_at = content.find(r#"data-enrich="summary-box""#).unwrap();
    let first_h2 = content.find("<h2>").unwrap();
    assert!(h1_end < summary_at && summary_at < first_h2);

    let related_at = content.find(r#"data-enrich="related-articles""#).unwrap();
    assert!(related_at < content.rfind("</article>").unwrap());
    assert!(content.contains(r#"href="/kb/retraction-tuning""#));
    assert_eq!(nested_anchor_count(&content), 0);
}

#[tokio::test]
async fn test_quick_facts_are_bounded() {
    let runner = BatchRunner::new(EnrichConfig::default(), seeded_store(), ScriptedGenerator::new(7));
    runner.run(&BatchRequest::single("petg")).await.unwrap();

    let content = stored_content(&runner, "petg");
    assert_eq!(content.matches("<dt>").count(), 4);
}

#[tokio::test]
async fn test_batch_excludes_short_articles() {
    let store = seeded_store();
    let short = Article::new("short", "Short note", "short-note", format!("<p>{}</p>", "x".repeat(393)));
    assert_eq!(short.content_length(), 400);
    store.insert(short).unwrap();

    let runner = BatchRunner::new(EnrichConfig::default(), store, NullGenerator);
    let response = runner.run(&BatchRequest::batch(20).dry_run(true)).await.unwrap();

    let ids: Vec<&str> = response.reports.iter().map(|r| r.article_id.as_str()).collect();
    assert_eq!(ids, vec!["petg"]);
}

#[tokio::test]
async fn test_already_enriched_article_is_skipped() {
    let body = format!(
        r#"<h1>Done</h1><aside class="article-summary" data-enrich="summary-box"><p>s</p></aside>
        <table class="technical-table" data-enrich="data-table"></table>
        <p>See <a href="/kb/bed-adhesion">bed adhesion</a>.</p>{}
        <section class="related-articles" data-enrich="related-articles"><h2>Related Articles</h2></section>"#,
        "<p>Plain prose without parameters.</p>".repeat(200)
    );
    let store = seeded_store();
    store.insert(Article::new("done", "Done", "done", body.clone()).with_category("materials")).unwrap();

    let generator = ScriptedGenerator::new(2);
    let runner = BatchRunner::new(EnrichConfig::default(), store, &generator);
    let response = runner.run(&BatchRequest::single("done")).await.unwrap();

    let report = &response.reports[0];
    assert_eq!(report.status, ReportStatus::Skipped);
    assert_eq!(report.reason.as_deref(), Some("already optimized"));
    assert_eq!(generator.calls(), 0);
    assert_eq!(stored_content(&runner, "done"), body);
    assert_eq!(runner.store().write_count().unwrap(), 0);
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let store = seeded_store();
    for (name, url) in [("PETG", "https://en.wikipedia.org/wiki/PETG"), ("PEI", "https://en.wikipedia.org/wiki/PEI")] {
        store.add_entity(ExternalEntityLink::new(name, url)).unwrap();
    }
    let runner = BatchRunner::new(EnrichConfig::default(), store, ScriptedGenerator::new(3));

    let first = runner.run(&BatchRequest::single("petg")).await.unwrap();
    assert_eq!(first.reports[0].status, ReportStatus::Success);
    assert_eq!(first.reports[0].entity_links_added, 2);
    let after_first = stored_content(&runner, "petg");

    let second = runner.run(&BatchRequest::single("petg")).await.unwrap();
    let report = &second.reports[0];
    assert_eq!(report.status, ReportStatus::Skipped);
    assert_eq!(report.reason.as_deref(), Some("already optimized"));
    assert!(!report.has_changes());
    assert_eq!(stored_content(&runner, "petg"), after_first);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let runner = BatchRunner::new(EnrichConfig::default(), seeded_store(), ScriptedGenerator::new(3));
    let before = stored_content(&runner, "petg");

    let response = runner.run(&BatchRequest::single("petg").dry_run(true)).await.unwrap();
    assert!(response.dry_run);
    assert_eq!(response.reports[0].status, ReportStatus::Success);
    assert!(response.reports[0].has_changes());
    assert!(response.reports[0].new_length > response.reports[0].original_length);

    assert_eq!(runner.store().write_count().unwrap(), 0);
    assert_eq!(stored_content(&runner, "petg"), before);
}

#[tokio::test]
async fn test_one_failing_write_does_not_stop_the_batch() {
    let store = MemoryStore::new();
    let base = fixture_article();
    for i in 0..5 {
        let mut article = base.clone();
        article.id = format!("a{i}");
        article.slug = format!("a-{i}");
        store.insert(article).unwrap();
    }
    store.fail_writes_for("a2").unwrap();

    let runner = BatchRunner::new(EnrichConfig::default(), store, NullGenerator);
    let response = runner.run(&BatchRequest::batch(20)).await.unwrap();

    assert_eq!(response.reports.len(), 5);
    assert_eq!(response.summary, BatchSummary { total: 5, enriched: 4, skipped: 0, errors: 1 });
    let failed = response.reports.iter().find(|r| r.status == ReportStatus::Error).unwrap();
    assert_eq!(failed.article_id, "a2");
    assert!(failed.error.is_some());
}

#[tokio::test]
async fn test_link_caps_are_honoured() {
    let store = seeded_store();
    let names = ["PETG", "PLA", "ABS", "PEI", "Bowden", "Z hop", "hobby knife", "heat gun"];
    for name in names {
        let url = format!("https://wiki.example/{}", name.replace(' ', "_"));
        store.add_entity(ExternalEntityLink::new(name, url)).unwrap();
    }

    let config = EnrichConfig::builder().max_internal_links(2).build();
    let runner = BatchRunner::new(config, store, NullGenerator);
    let response = runner.run(&BatchRequest::single("petg")).await.unwrap();

    let report = &response.reports[0];
    assert!(!report.summary_box_added);
    assert_eq!(report.internal_links_added, 2);
    assert_eq!(report.entity_links_added, 5);

    let content = stored_content(&runner, "petg");
    assert_eq!(content.matches(r#"data-enrich="entity-link""#).count(), 5);
    assert_eq!(content.matches(r#"data-enrich="internal-link""#).count(), 2);
    assert_eq!(nested_anchor_count(&content), 0);
}

#[tokio::test]
async fn test_single_article_not_found() {
    let runner = BatchRunner::new(EnrichConfig::default(), seeded_store(), NullGenerator);
    let err = runner.run(&BatchRequest::single("missing")).await.unwrap_err();
    assert!(matches!(err, GlossError::ArticleNotFound(_)));
    assert_eq!(runner.store().write_count().unwrap(), 0);
}

#[test]
fn test_detection_of_fixture() {
    let detection = Detection::inspect(&fixture_article().content, "/kb/");
    assert!(!detection.is_fully_enriched());
    assert_eq!(detection.technical_lists, 2);
}
