//! qprep-qa library - Quiz Assembly module
//!
//! Assembles practice quizzes from the question corpus: plans a type
//! mix, samples valid candidates, keeps reading passages together,
//! degrades gracefully when the corpus runs short, and reports usage
//! to the accounts service without ever blocking delivery on it.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod engine;
pub mod quota;
pub mod repo;
pub mod settings;

use engine::QuizAssembler;
use quota::QuotaLedger;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Corpus database pool (read-only at request time)
    pub db: SqlitePool,
    /// Shared assembly engine
    pub assembler: Arc<QuizAssembler>,
    /// Quota ledger client, consulted per identified request
    pub ledger: Arc<dyn QuotaLedger>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        assembler: Arc<QuizAssembler>,
        ledger: Arc<dyn QuotaLedger>,
    ) -> Self {
        Self {
            db,
            assembler,
            ledger,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/quiz", post(api::create_quiz))
        .route("/api/corpus/summary", get(api::get_corpus_summary))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Browser clients hit this service directly during development
        .layer(CorsLayer::permissive())
}
