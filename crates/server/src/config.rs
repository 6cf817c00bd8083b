//! Environment-driven service configuration.

use std::net::SocketAddr;

use gloss_core::{GeneratorConfig, GlossError, Result};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_ARTICLE_PREFIX: &str = "/kb/";

/// Everything the service reads at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    /// `None` when no generator key is set; the summary stage is then skipped.
    pub generator: Option<GeneratorConfig>,
    pub article_prefix: String,
}

impl ServerConfig {
    /// Reads `GLOSS_BIND`, `DATABASE_URL`, `GLOSS_GENERATOR_URL`,
    /// `GLOSS_GENERATOR_KEY`, `GLOSS_GENERATOR_MODEL` and `GLOSS_ARTICLE_PREFIX`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = var("GLOSS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .map_err(|_| GlossError::Config(format!("GLOSS_BIND is not a socket address: {bind_raw}")))?;

        let database_url = var("DATABASE_URL").ok_or_else(|| GlossError::Config("DATABASE_URL is not set".to_string()))?;

        let generator = var("GLOSS_GENERATOR_KEY").map(|api_key| {
            let defaults = GeneratorConfig::default();
            GeneratorConfig {
                api_url: var("GLOSS_GENERATOR_URL").unwrap_or(defaults.api_url),
                api_key,
                model: var("GLOSS_GENERATOR_MODEL").unwrap_or(defaults.model),
                ..GeneratorConfig::default()
            }
        });

        Ok(Self {
            bind,
            database_url,
            generator,
            article_prefix: var("GLOSS_ARTICLE_PREFIX").unwrap_or_else(|| DEFAULT_ARTICLE_PREFIX.to_string()),
        })
    }
}
