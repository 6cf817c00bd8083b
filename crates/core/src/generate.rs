//! Summary and quick-fact generation.
//!
//! The [`ContentGenerator`] trait is the seam between the orchestrator and the
//! external text-generation service. Generation is best-effort: every failure
//! mode (transport, non-success status, unparsable reply) yields `None` and a
//! `warn` event, never an error, and nothing is retried.

use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::article::{GeneratedSummary, QuickFact};

/// Produces a summary and quick facts for an article.
pub trait ContentGenerator: Send + Sync {
    /// `content` is already truncated to the configured prefix.
    fn generate(&self, title: &str, content: &str) -> impl Future<Output = Option<GeneratedSummary>> + Send;
}

/// A generator that never produces anything; the summary stage is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGenerator;

impl ContentGenerator for NullGenerator {
    async fn generate(&self, _title: &str, _content: &str) -> Option<GeneratedSummary> {
        None
    }
}

/// An unconfigured generator behaves like [`NullGenerator`].
impl<G: ContentGenerator> ContentGenerator for Option<G> {
    async fn generate(&self, title: &str, content: &str) -> Option<GeneratedSummary> {
        match self {
            Some(generator) => generator.generate(title, content).await,
            None => None,
        }
    }
}

pub(crate) const SYSTEM_PROMPT: &str = "You are a technical editor for a 3D printing knowledge base. \
Reply ONLY with a JSON object of the form \
{\"summary\": \"...\", \"quickFacts\": [{\"label\": \"...\", \"value\": \"...\"}]}. \
The summary is two or three sentences. Give at most 4 quick facts. \
Use only information stated in the article; do not invent values.";

pub(crate) fn user_prompt(title: &str, content: &str) -> String {
    format!("Article title: {title}\n\nArticle content (HTML):\n{content}\n\nWrite the summary and quick facts.")
}

/// Locates the first balanced `{...}` region in free text.
///
/// Braces inside JSON string literals are ignored, so a summary containing
/// `}` does not end the object early.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyPayload {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, alias = "quick_facts")]
    quick_facts: Vec<ReplyFact>,
}

#[derive(Debug, Deserialize)]
struct ReplyFact {
    #[serde(default)]
    label: Value,
    #[serde(default)]
    value: Value,
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Parses the assistant's free-text reply into a summary.
///
/// Returns `None` when no JSON object is present, it does not parse, or the
/// summary is missing or blank. Facts without a label or value are dropped
/// and at most four are kept.
pub fn parse_reply(text: &str) -> Option<GeneratedSummary> {
    let json = extract_json_object(text)?;
    let payload: ReplyPayload = serde_json::from_str(json).ok()?;

    let summary = payload.summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    let facts = payload
        .quick_facts
        .iter()
        .filter_map(|f| Some(QuickFact { label: scalar_text(&f.label)?, value: scalar_text(&f.value)? }))
        .collect();

    Some(GeneratedSummary::new(summary, facts))
}

#[cfg(feature = "generate")]
pub use http::{GeneratorConfig, HttpGenerator};

#[cfg(feature = "generate")]
mod http {
    use std::time::Duration;

    use reqwest::Client;
    use serde::{Deserialize, Serialize};
    use url::Url;

    use super::{ContentGenerator, SYSTEM_PROMPT, parse_reply, user_prompt};
    use crate::article::GeneratedSummary;
    use crate::{GlossError, Result};

    /// Connection settings for the content generation service.
    #[derive(Debug, Clone)]
    pub struct GeneratorConfig {
        /// Chat-completions endpoint.
        pub api_url: String,
        /// Bearer credential.
        pub api_key: String,
        /// Model identifier sent with each request.
        pub model: String,
        /// Sampling temperature.
        pub temperature: f32,
        /// Request timeout in seconds. `None` keeps the transport default.
        pub timeout: Option<u64>,
    }

    impl Default for GeneratorConfig {
        fn default() -> Self {
            Self {
                api_url: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: String::new(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.3,
                timeout: None,
            }
        }
    }

    #[derive(Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        messages: [ChatMessage<'a>; 2],
        temperature: f32,
    }

    #[derive(Serialize)]
    struct ChatMessage<'a> {
        role: &'static str,
        content: &'a str,
    }

    #[derive(Deserialize)]
    struct ChatResponse {
        #[serde(default)]
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: AssistantMessage,
    }

    #[derive(Deserialize)]
    struct AssistantMessage {
        #[serde(default)]
        content: Option<String>,
    }

    /// [`ContentGenerator`] backed by a chat-completions HTTP API.
    #[derive(Debug, Clone)]
    pub struct HttpGenerator {
        client: Client,
        endpoint: Url,
        config: GeneratorConfig,
    }

    impl HttpGenerator {
        /// Validates the configuration and builds the HTTP client.
        pub fn new(config: GeneratorConfig) -> Result<Self> {
            let endpoint = Url::parse(&config.api_url).map_err(|e| GlossError::InvalidUrl(e.to_string()))?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(GlossError::InvalidUrl(format!("unsupported scheme: {}", endpoint.scheme())));
            }
            if config.api_key.trim().is_empty() {
                return Err(GlossError::Config("generator API key is empty".to_string()));
            }

            let mut builder = Client::builder();
            if let Some(secs) = config.timeout {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let client = builder.build().map_err(GlossError::Http)?;

            Ok(Self { client, endpoint, config })
        }

        pub fn config(&self) -> &GeneratorConfig {
            &self.config
        }

        /// Sends one request and returns the assistant's reply text.
        pub async fn complete(&self, title: &str, content: &str) -> Result<String> {
            let prompt = user_prompt(title, content);
            let body = ChatRequest {
                model: &self.config.model,
                messages: [
                    ChatMessage { role: "system", content: SYSTEM_PROMPT },
                    ChatMessage { role: "user", content: &prompt },
                ],
                temperature: self.config.temperature,
            };

            let response = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| match self.config.timeout {
                    Some(timeout) if e.is_timeout() => GlossError::Timeout { timeout },
                    _ => GlossError::Http(e),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(GlossError::Generation(format!("service returned {status}")));
            }

            let parsed: ChatResponse = response.json().await?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| GlossError::Generation("reply has no assistant message".to_string()))
        }
    }

    impl ContentGenerator for HttpGenerator {
        async fn generate(&self, title: &str, content: &str) -> Option<GeneratedSummary> {
            let reply = match self.complete(title, content).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!(error = %e, title, "content generation failed");
                    return None;
                }
            };

            let summary = parse_reply(&reply);
            if summary.is_none() {
                tracing::warn!(title, reply_len = reply.len(), "generation reply had no usable JSON object");
            }
            summary
        }
    }
}
