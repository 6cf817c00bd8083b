//! Article store interface and an in-memory implementation.
//!
//! The pipeline reads articles, the related pool and the entity corpus
//! through [`ArticleStore`], and writes back nothing but article content.
//! [`MemoryStore`] backs the CLI and the test suites; the server crate
//! provides a Postgres implementation.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::article::{Article, ExternalEntityLink, RelatedCandidate};
use crate::{GlossError, Result};

/// Read/write access to the persistent article store.
pub trait ArticleStore: Send + Sync {
    /// One active article by identifier.
    fn get_article(&self, id: &str) -> impl Future<Output = Result<Option<Article>>> + Send;

    /// Active articles, most recently modified first.
    fn recent_articles(&self, limit: usize) -> impl Future<Output = Result<Vec<Article>>> + Send;

    /// Active articles usable as related-article candidates.
    fn related_pool(&self, limit: usize) -> impl Future<Output = Result<Vec<RelatedCandidate>>> + Send;

    /// The approved entity-link corpus.
    fn approved_entities(&self) -> impl Future<Output = Result<Vec<ExternalEntityLink>>> + Send;

    /// Replace an article's content and bump its modification timestamp.
    fn update_content(&self, id: &str, content: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
struct StoredArticle {
    article: Article,
    active: bool,
    modified: u64,
}

#[derive(Debug, Default)]
struct Inner {
    articles: Vec<StoredArticle>,
    entities: Vec<ExternalEntityLink>,
    clock: u64,
    writes: usize,
    failing: HashSet<String>,
    reads_fail: bool,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn active_by_recency(&self) -> Vec<&StoredArticle> {
        let mut active: Vec<&StoredArticle> = self.articles.iter().filter(|s| s.active).collect();
        active.sort_by(|a, b| b.modified.cmp(&a.modified));
        active
    }
}

/// An [`ArticleStore`] held in memory.
///
/// Modification "timestamps" are a logical clock: each insert or write is
/// newer than everything before it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| GlossError::Store("memory store lock poisoned".to_string()))
    }

    fn read(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if inner.reads_fail {
            return Err(GlossError::Store("memory store is unreadable".to_string()));
        }
        Ok(inner)
    }

    /// Adds an active article, newer than anything stored so far.
    pub fn insert(&self, article: Article) -> Result<()> {
        self.insert_with_state(article, true)
    }

    /// Adds an article that is not active (draft or archived).
    pub fn insert_inactive(&self, article: Article) -> Result<()> {
        self.insert_with_state(article, false)
    }

    fn insert_with_state(&self, article: Article, active: bool) -> Result<()> {
        let mut inner = self.lock()?;
        let modified = inner.tick();
        inner.articles.retain(|s| s.article.id != article.id);
        inner.articles.push(StoredArticle { article, active, modified });
        Ok(())
    }

    /// Adds an approved entity link.
    pub fn add_entity(&self, entity: ExternalEntityLink) -> Result<()> {
        self.lock()?.entities.push(entity);
        Ok(())
    }

    /// Makes every subsequent content write for `id` fail.
    pub fn fail_writes_for(&self, id: impl Into<String>) -> Result<()> {
        self.lock()?.failing.insert(id.into());
        Ok(())
    }

    /// Makes every subsequent read through [`ArticleStore`] fail, or stop failing.
    pub fn fail_reads(&self, fail: bool) -> Result<()> {
        self.lock()?.reads_fail = fail;
        Ok(())
    }

    /// Number of successful content writes.
    pub fn write_count(&self) -> Result<usize> {
        Ok(self.lock()?.writes)
    }

    /// Current stored state of an article, active or not.
    pub fn article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.lock()?.articles.iter().find(|s| s.article.id == id).map(|s| s.article.clone()))
    }
}

impl ArticleStore for MemoryStore {
    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let inner = self.read()?;
        Ok(inner.articles.iter().find(|s| s.active && s.article.id == id).map(|s| s.article.clone()))
    }

    async fn recent_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let inner = self.read()?;
        Ok(inner.active_by_recency().into_iter().take(limit).map(|s| s.article.clone()).collect())
    }

    async fn related_pool(&self, limit: usize) -> Result<Vec<RelatedCandidate>> {
        let inner = self.read()?;
        Ok(inner.active_by_recency().into_iter().take(limit).map(|s| s.article.as_candidate()).collect())
    }

    async fn approved_entities(&self) -> Result<Vec<ExternalEntityLink>> {
        Ok(self.read()?.entities.clone())
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.failing.contains(id) {
            return Err(GlossError::Store(format!("write rejected for article {id}")));
        }

        let modified = inner.tick();
        let stored = inner
            .articles
            .iter_mut()
            .find(|s| s.article.id == id)
            .ok_or_else(|| GlossError::Store(format!("no article with id {id}")))?;
        stored.article.content = content.to_string();
        stored.modified = modified;
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> Article {
        Article::new(id, format!("Title {id}"), format!("slug-{id}"), format!("<p>{id}</p>"))
    }

    #[tokio::test]
    async fn test_recent_articles_newest_first_and_active_only() {
        let store = MemoryStore::new();
        store.insert(article("a")).unwrap();
        store.insert_inactive(article("draft")).unwrap();
        store.insert(article("b")).unwrap();
        store.insert(article("c")).unwrap();

        let ids: Vec<String> = store.recent_articles(2).await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(store.get_article("draft").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_content_bumps_recency() {
        let store = MemoryStore::new();
        store.insert(article("a")).unwrap();
        store.insert(article("b")).unwrap();

        store.update_content("a", "<p>new</p>").await.unwrap();
        assert_eq!(store.write_count().unwrap(), 1);
        assert_eq!(store.article("a").unwrap().unwrap().content, "<p>new</p>");

        let first = store.recent_articles(1).await.unwrap();
        assert_eq!(first[0].id, "a");
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryStore::new();
        store.insert(article("a")).unwrap();
        store.fail_writes_for("a").unwrap();

        let err = store.update_content("a", "x").await.unwrap_err();
        assert!(matches!(err, GlossError::Store(_)));
        assert_eq!(store.write_count().unwrap(), 0);
        assert!(store.update_content("missing", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let store = MemoryStore::new();
        store.insert(article("a")).unwrap();
        store.fail_reads(true).unwrap();

        assert!(matches!(store.get_article("a").await, Err(GlossError::Store(_))));
        assert!(store.recent_articles(5).await.is_err());
        assert!(store.related_pool(5).await.is_err());
        assert!(store.approved_entities().await.is_err());
        assert!(store.article("a").unwrap().is_some());

        store.fail_reads(false).unwrap();
        assert_eq!(store.recent_articles(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_related_pool_projection() {
        let store = MemoryStore::new();
        store.insert(article("a").with_category("materials").with_excerpt("About a")).unwrap();
        let pool = store.related_pool(10).await.unwrap();
        assert_eq!(pool[0].category_id.as_deref(), Some("materials"));
        assert_eq!(pool[0].excerpt.as_deref(), Some("About a"));
    }
}
