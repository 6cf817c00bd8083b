use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{
        HeaderName, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use gloss_core::{ArticleStore, BatchRequest, BatchResponse, BatchRunner, ContentGenerator, GlossError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

// --- Error Handling ---
pub enum AppError {
    /// Body was not a valid request document.
    Body(String),
    /// The run failed before producing reports.
    Run(GlossError),
}

impl From<GlossError> for AppError {
    fn from(e: GlossError) -> Self {
        AppError::Run(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Body(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match self {
            AppError::Body(msg) => {
                tracing::warn!(error = %msg, "rejected request body");
                msg
            }
            AppError::Run(e) => {
                tracing::error!(error = %e, "enrichment request failed");
                e.to_string()
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { success: false, error })).into_response()
    }
}

// --- Handlers ---
async fn enrich_articles<S, G>(
    State(runner): State<Arc<BatchRunner<S, G>>>, payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError>
where
    S: ArticleStore + 'static,
    G: ContentGenerator + 'static,
{
    let Json(request) = payload?;
    tracing::info!(
        article_id = request.article_id.as_deref().unwrap_or("-"),
        batch = request.batch_process,
        dry_run = request.dry_run,
        limit = request.limit,
        "enrich request"
    );
    Ok(Json(runner.run(&request).await?))
}

async fn health() -> &'static str {
    "ok"
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
}

/// The service router: `POST /enrich-articles` and `GET /health`.
pub fn router<S, G>(runner: Arc<BatchRunner<S, G>>) -> Router
where
    S: ArticleStore + 'static,
    G: ContentGenerator + 'static,
{
    Router::new()
        .route("/enrich-articles", post(enrich_articles::<S, G>))
        .route("/health", get(health))
        .with_state(runner)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors()))
}
