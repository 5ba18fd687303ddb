//! Question repository abstraction
//!
//! The engine selects through this trait; the SQLite implementation is
//! the production backing store.

pub mod sqlite;

pub use sqlite::SqliteQuestionRepository;

use crate::engine::validity::{self, ValidityScope};
use async_trait::async_trait;
use qprep_common::db::models::{Category, Difficulty, Question, QuestionType};
use qprep_common::Result;
use std::collections::HashSet;
use uuid::Uuid;

/// Narrowing applied when fetching candidates.
///
/// `question_type` pins a single type; `types` is the permitted set
/// used by the cross-type fallback. Both unset means any type.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub question_type: Option<QuestionType>,
    pub types: Option<Vec<QuestionType>>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub scope: ValidityScope,
}

impl CandidateFilter {
    /// Whether a row satisfies both the structural narrowing and the
    /// validity scope of this filter.
    pub fn accepts(&self, question: &Question) -> bool {
        if let Some(qt) = self.question_type {
            if question.question_type != qt {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.contains(&question.question_type) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if question.category != category {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if question.difficulty != Some(difficulty) {
                return false;
            }
        }
        validity::is_valid(question, self.scope)
    }
}

/// Read access to the question corpus.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Uniformly sample up to `limit` questions accepted by the filter,
    /// never returning an id present in `exclude`.
    async fn sample(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> Result<Vec<Question>>;

    /// Every passage-attached candidate accepted by the filter, for the
    /// grouper to bucket and rank. No limit: grouping needs the whole
    /// pool to rank passages fairly.
    async fn group_candidates(
        &self,
        filter: &CandidateFilter,
        exclude: &HashSet<Uuid>,
    ) -> Result<Vec<Question>>;
}
