//! SQLite question repository
//!
//! Narrowing happens in SQL; the validity rules run in Rust on the
//! fetched rows so there is exactly one implementation of them. Random
//! sampling rides on `ORDER BY RANDOM()`, which is uniform over the
//! rows the WHERE clause admits.

use super::{CandidateFilter, QuestionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qprep_common::db::models::{options_from_json, Question};
use qprep_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

const QUESTION_COLUMNS: &str = "guid, question_type, category, difficulty, question_text, \
     options, correct_answer, explanation, passage_id, passage_text, sequence_in_passage, \
     topic, source, created_at";

/// Production repository over the corpus database.
pub struct SqliteQuestionRepository {
    db: SqlitePool,
}

impl SqliteQuestionRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuestionRepository for SqliteQuestionRepository {
    async fn sample(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> Result<Vec<Question>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let (clauses, binds) = narrowing_clauses(filter, exclude);
        let sql = format!(
            "SELECT {} FROM questions{} ORDER BY RANDOM()",
            QUESTION_COLUMNS,
            where_sql(&clauses)
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(&self.db).await?;

        // Rows arrive in random order; taking the first `limit` that
        // pass validity is a uniform sample of the valid subset
        let mut sampled = Vec::new();
        for row in &rows {
            let question = question_from_row(row)?;
            if filter.accepts(&question) {
                sampled.push(question);
                if sampled.len() == limit {
                    break;
                }
            }
        }

        tracing::debug!(
            requested = limit,
            fetched = rows.len(),
            sampled = sampled.len(),
            "Sampled question candidates"
        );
        Ok(sampled)
    }

    async fn group_candidates(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
    ) -> Result<Vec<Question>> {
        let (mut clauses, binds) = narrowing_clauses(filter, exclude);
        clauses.push("passage_id IS NOT NULL".to_string());

        let sql = format!(
            "SELECT {} FROM questions{}",
            QUESTION_COLUMNS,
            where_sql(&clauses)
        );

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query.fetch_all(&self.db).await?;

        let mut candidates = Vec::new();
        for row in &rows {
            let question = question_from_row(row)?;
            if filter.accepts(&question) {
                candidates.push(question);
            }
        }

        tracing::debug!(
            fetched = rows.len(),
            candidates = candidates.len(),
            "Fetched passage group candidates"
        );
        Ok(candidates)
    }
}

/// SQL narrowing for a candidate filter: WHERE clauses plus their binds.
fn narrowing_clauses(
    filter: &CandidateFilter,
    exclude: &HashSet<Uuid>,
) -> (Vec<String>, Vec<String>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(question_type) = filter.question_type {
        clauses.push("question_type = ?".to_string());
        binds.push(question_type.as_str().to_string());
    }
    if let Some(types) = &filter.types {
        if types.is_empty() {
            clauses.push("1 = 0".to_string());
        } else {
            let placeholders = vec!["?"; types.len()].join(", ");
            clauses.push(format!("question_type IN ({})", placeholders));
            for question_type in types {
                binds.push(question_type.as_str().to_string());
            }
        }
    }
    if let Some(category) = filter.category {
        clauses.push("category = ?".to_string());
        binds.push(category.as_str().to_string());
    }
    if let Some(difficulty) = filter.difficulty {
        clauses.push("difficulty = ?".to_string());
        binds.push(difficulty.as_str().to_string());
    }
    if !exclude.is_empty() {
        let placeholders = vec!["?"; exclude.len()].join(", ");
        clauses.push(format!("guid NOT IN ({})", placeholders));
        for id in exclude {
            binds.push(id.to_string());
        }
    }

    (clauses, binds)
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// Map one `questions` row into the domain model.
pub(crate) fn question_from_row(row: &SqliteRow) -> Result<Question> {
    let id_text: String = row.try_get("guid")?;
    let type_text: String = row.try_get("question_type")?;
    let category_text: String = row.try_get("category")?;
    let difficulty_text: Option<String> = row.try_get("difficulty")?;
    let options_text: String = row.try_get("options")?;
    let passage_id_text: Option<String> = row.try_get("passage_id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Question {
        id: parse_guid(&id_text)?,
        question_type: type_text.parse()?,
        category: category_text.parse()?,
        difficulty: difficulty_text.as_deref().map(str::parse).transpose()?,
        text: row.try_get("question_text")?,
        options: options_from_json(&options_text),
        correct_answer: row.try_get("correct_answer")?,
        explanation: row.try_get("explanation")?,
        passage_id: passage_id_text.as_deref().map(parse_guid).transpose()?,
        passage_text: row.try_get("passage_text")?,
        sequence_in_passage: row.try_get("sequence_in_passage")?,
        topic: row.try_get("topic")?,
        source: row.try_get("source")?,
        created_at,
    })
}

fn parse_guid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::Internal(format!("Malformed guid in corpus: {}", e)))
}
