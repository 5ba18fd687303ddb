//! Presentation formatting for assembled quizzes
//!
//! Selected rows are reshaped for delivery: answer options flatten to a
//! list in label order (labels dropped), and grading fields never leave
//! the service.

use qprep_common::db::models::{Category, Difficulty, Question, QuestionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One question as delivered to the client.
///
/// `options` preserves label order (A through E) with the labels
/// themselves dropped; clients render positionally. The correct answer
/// and explanation are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_in_passage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// An assembled quiz ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    /// Fresh identifier minted per assembly call
    pub quiz_id: Uuid,
    /// Suggested duration in minutes, echoed from the request unchanged
    pub time_limit: i64,
    pub question_count: usize,
    pub questions: Vec<QuizQuestion>,
}

/// Format arranged questions into the delivery shape.
pub fn format_quiz(questions: Vec<Question>, time_limit: i64) -> Quiz {
    let questions: Vec<QuizQuestion> = questions.into_iter().map(format_question).collect();
    Quiz {
        quiz_id: Uuid::new_v4(),
        time_limit,
        question_count: questions.len(),
        questions,
    }
}

fn format_question(question: Question) -> QuizQuestion {
    QuizQuestion {
        id: question.id,
        question_type: question.question_type,
        category: question.category,
        difficulty: question.difficulty,
        text: question.text,
        options: flatten_options(&question.options),
        passage_id: question.passage_id,
        passage_text: question.passage_text,
        sequence_in_passage: question.sequence_in_passage,
        topic: question.topic,
        source: question.source,
    }
}

/// Option texts in label order; the map is label-keyed so iteration
/// order is already A..E.
fn flatten_options(options: &BTreeMap<String, String>) -> Vec<String> {
    options.values().cloned().collect()
}
