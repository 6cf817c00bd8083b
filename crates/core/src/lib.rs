pub mod article;
pub mod batch;
pub mod config;
pub mod detect;
pub mod enrich;
pub mod error;
pub mod generate;
pub mod markup;
pub mod relevance;
pub mod report;
pub mod stages;
pub mod store;

pub use article::{Article, ExternalEntityLink, GeneratedSummary, QuickFact, RelatedArticleRef, RelatedCandidate};
pub use batch::{BatchRequest, BatchResponse, BatchRunner};
pub use config::{Concurrency, EnrichConfig, EnrichConfigBuilder};
pub use detect::Detection;
pub use enrich::{Enricher, RunOptions, SharedContext, StageCounts, StageInputs, enrich_html};
pub use error::{GlossError, Result};
pub use generate::{ContentGenerator, NullGenerator, parse_reply};
#[cfg(feature = "generate")]
pub use generate::{GeneratorConfig, HttpGenerator};
pub use relevance::rank_candidates;
pub use report::{BatchSummary, EnrichmentReport, ReportStatus};
pub use store::{ArticleStore, MemoryStore};
