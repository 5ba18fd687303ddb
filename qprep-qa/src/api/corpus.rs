//! Corpus inventory endpoint
//!
//! Operators use this to see the corpus the way the engine sees it:
//! raw row counts per type next to how many rows actually clear the
//! serving bar, plus a difficulty histogram.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::warn;

use crate::engine::validity::{self, ValidityScope};
use crate::repo::sqlite::question_from_row;
use crate::AppState;
use qprep_common::db::models::{Question, QuestionType};

/// Per-type corpus counts
#[derive(Debug, Serialize)]
pub struct TypeSummary {
    pub question_type: QuestionType,
    /// Rows of this type in the corpus
    pub total: i64,
    /// Rows that pass full validity and can be served
    pub usable: i64,
}

/// Corpus summary response
#[derive(Debug, Serialize)]
pub struct CorpusSummary {
    pub total_questions: i64,
    /// Rows the engine cannot even decode (bad guid, unknown type)
    pub malformed: i64,
    pub types: Vec<TypeSummary>,
    pub difficulty_histogram: BTreeMap<String, i64>,
}

/// GET /api/corpus/summary
pub async fn get_corpus_summary(
    State(state): State<AppState>,
) -> Result<Json<CorpusSummary>, SummaryError> {
    let rows = sqlx::query(
        "SELECT guid, question_type, category, difficulty, question_text, options,
                correct_answer, explanation, passage_id, passage_text, sequence_in_passage,
                topic, source, created_at
         FROM questions",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| SummaryError::DatabaseError(e.to_string()))?;

    let mut questions: Vec<Question> = Vec::with_capacity(rows.len());
    let mut malformed = 0i64;
    for row in &rows {
        match question_from_row(row) {
            Ok(question) => questions.push(question),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable corpus row in summary");
                malformed += 1;
            }
        }
    }

    let mut types = Vec::with_capacity(QuestionType::ALL.len());
    for question_type in QuestionType::ALL {
        let total = questions
            .iter()
            .filter(|q| q.question_type == question_type)
            .count();
        let usable = questions
            .iter()
            .filter(|q| q.question_type == question_type)
            .filter(|q| validity::is_valid(q, ValidityScope::Full))
            .count();
        types.push(TypeSummary {
            question_type,
            total: total as i64,
            usable: usable as i64,
        });
    }

    let mut difficulty_histogram: BTreeMap<String, i64> = BTreeMap::new();
    for question in &questions {
        let label = question
            .difficulty
            .map(|d| d.as_str().to_string())
            .unwrap_or_else(|| "unrated".to_string());
        *difficulty_histogram.entry(label).or_insert(0) += 1;
    }

    Ok(Json(CorpusSummary {
        total_questions: rows.len() as i64,
        malformed,
        types,
        difficulty_histogram,
    }))
}

/// Summary errors
#[derive(Debug)]
pub enum SummaryError {
    DatabaseError(String),
}

impl IntoResponse for SummaryError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SummaryError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
