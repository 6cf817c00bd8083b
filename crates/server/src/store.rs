//! Postgres-backed [`ArticleStore`].
//!
//! Expected schema (only the columns read or written here):
//!
//! ```sql
//! CREATE TABLE articles (
//!     id          uuid PRIMARY KEY,
//!     title       text NOT NULL,
//!     slug        text NOT NULL,
//!     category_id uuid,
//!     keywords    text[],
//!     content     text NOT NULL,
//!     excerpt     text,
//!     status      text NOT NULL,
//!     updated_at  timestamptz NOT NULL
//! );
//!
//! CREATE TABLE entity_links (
//!     name        text NOT NULL,
//!     url         text NOT NULL,
//!     description text,
//!     status      text NOT NULL
//! );
//! ```

use std::fmt::Display;

use deadpool_postgres::{Config, Pool, Runtime};
use gloss_core::{Article, ArticleStore, ExternalEntityLink, GlossError, RelatedCandidate, Result};
use time::OffsetDateTime;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

const ARTICLE_COLUMNS: &str = "id, title, slug, category_id, keywords, content, excerpt";

fn store_error(e: impl Display) -> GlossError {
    GlossError::Store(e.to_string())
}

fn article_from_row(row: &Row) -> Result<Article> {
    let id: Uuid = row.try_get("id").map_err(store_error)?;
    let category_id: Option<Uuid> = row.try_get("category_id").map_err(store_error)?;
    let keywords: Option<Vec<String>> = row.try_get("keywords").map_err(store_error)?;

    let mut article = Article::new(
        id.to_string(),
        row.try_get::<_, String>("title").map_err(store_error)?,
        row.try_get::<_, String>("slug").map_err(store_error)?,
        row.try_get::<_, String>("content").map_err(store_error)?,
    )
    .with_keywords(keywords.unwrap_or_default());
    article.category_id = category_id.map(|c| c.to_string());
    article.excerpt = row.try_get("excerpt").map_err(store_error)?;
    Ok(article)
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Connection-pooled store over the `articles` and `entity_links` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Builds a pool for `database_url`. Connections are opened lazily.
    pub fn connect(database_url: &str) -> Result<Self> {
        let config = Config { url: Some(database_url.to_string()), ..Default::default() };
        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| GlossError::Config(format!("database pool: {e}")))?;
        Ok(Self { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Client> {
        self.pool.get().await.map_err(store_error)
    }
}

impl ArticleStore for PgStore {
    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let client = self.client().await?;
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1 AND status = 'published'");
        let row = client.query_opt(sql.as_str(), &[&id]).await.map_err(store_error)?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn recent_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let client = self.client().await?;
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = 'published' ORDER BY updated_at DESC LIMIT $1"
        );
        let rows = client.query(sql.as_str(), &[&limit_param(limit)]).await.map_err(store_error)?;
        rows.iter().map(article_from_row).collect()
    }

    async fn related_pool(&self, limit: usize) -> Result<Vec<RelatedCandidate>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, slug, title, excerpt, category_id, keywords FROM articles \
                 WHERE status = 'published' ORDER BY updated_at DESC LIMIT $1",
                &[&limit_param(limit)],
            )
            .await
            .map_err(store_error)?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(store_error)?;
                let category_id: Option<Uuid> = row.try_get("category_id").map_err(store_error)?;
                let keywords: Option<Vec<String>> = row.try_get("keywords").map_err(store_error)?;
                Ok(RelatedCandidate {
                    id: id.to_string(),
                    slug: row.try_get("slug").map_err(store_error)?,
                    title: row.try_get("title").map_err(store_error)?,
                    excerpt: row.try_get("excerpt").map_err(store_error)?,
                    category_id: category_id.map(|c| c.to_string()),
                    keywords: keywords.unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn approved_entities(&self) -> Result<Vec<ExternalEntityLink>> {
        let client = self.client().await?;
        let rows = client
            .query("SELECT name, url, description FROM entity_links WHERE status = 'approved' ORDER BY name", &[])
            .await
            .map_err(store_error)?;

        rows.iter()
            .map(|row| {
                Ok(ExternalEntityLink {
                    name: row.try_get("name").map_err(store_error)?,
                    url: row.try_get("url").map_err(store_error)?,
                    description: row.try_get("description").map_err(store_error)?,
                })
            })
            .collect()
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<()> {
        let uuid = Uuid::parse_str(id).map_err(|e| GlossError::Store(format!("bad article id {id}: {e}")))?;
        let client = self.client().await?;
        let updated = client
            .execute(
                "UPDATE articles SET content = $1, updated_at = $2 WHERE id = $3",
                &[&content, &OffsetDateTime::now_utc(), &uuid],
            )
            .await
            .map_err(store_error)?;

        if updated == 0 {
            return Err(GlossError::Store(format!("no article with id {id}")));
        }
        Ok(())
    }
}
