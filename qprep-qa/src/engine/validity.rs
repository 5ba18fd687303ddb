//! Usability rules for corpus rows
//!
//! The corpus is ingested from scraped exports, so rows can be missing
//! prompts, options, or passage context. Selection never serves a row
//! that fails the rules for the requested scope.

use qprep_common::db::models::{Question, QuestionType};

/// How much of the rule set applies when filtering candidates.
///
/// `Full` is the normal serving bar; `Base` drops the per-type rules
/// and is used by the later fallback stages when supply runs short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidityScope {
    /// Structural rules only: prompt, options, answer key
    Base,
    /// Base rules plus the per-type rules
    #[default]
    Full,
}

/// Check a question against the rules for the given scope.
pub fn is_valid(question: &Question, scope: ValidityScope) -> bool {
    match scope {
        ValidityScope::Base => base_valid(question),
        ValidityScope::Full => base_valid(question) && type_valid(question),
    }
}

/// Structural rules every served question must satisfy:
/// non-blank prompt, at least two options with text, and a correct
/// answer that names one of the option labels.
fn base_valid(question: &Question) -> bool {
    if question.text.trim().is_empty() {
        return false;
    }

    let usable_options = question
        .options
        .iter()
        .filter(|(label, text)| !label.trim().is_empty() && !text.trim().is_empty())
        .count();
    if usable_options < 2 {
        return false;
    }

    match &question.correct_answer {
        Some(answer) => question.options.contains_key(answer.trim()),
        None => false,
    }
}

/// Per-type rules layered on top of the structural ones.
fn type_valid(question: &Question) -> bool {
    match question.question_type {
        // Passage members must carry their shared context and ordering
        QuestionType::ReadingComprehension => {
            question.passage_id.is_some()
                && question
                    .passage_text
                    .as_deref()
                    .is_some_and(|text| !text.trim().is_empty())
                && question.sequence_in_passage.is_some()
        }
        // Both numbered statements must appear in the prompt. A plain
        // substring check; the exports are too inconsistent for more.
        QuestionType::DataSufficiency => {
            question.text.contains("(1)") && question.text.contains("(2)")
        }
        // The argument under test rides in the passage text field; a
        // row without its stimulus cannot be answered
        QuestionType::CriticalReasoning => question
            .passage_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty()),
        QuestionType::ProblemSolving => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use qprep_common::db::models::Category;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(label, text)| (label.to_string(), text.to_string()))
            .collect()
    }

    fn question(question_type: QuestionType) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_type,
            category: Category::Quantitative,
            difficulty: None,
            text: "If x = 2, what is x + 3?".to_string(),
            options: options(&[("A", "4"), ("B", "5"), ("C", "6")]),
            correct_answer: Some("B".to_string()),
            explanation: None,
            passage_id: None,
            passage_text: None,
            sequence_in_passage: None,
            topic: None,
            source: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_accepts_complete_question() {
        let q = question(QuestionType::ProblemSolving);
        assert!(is_valid(&q, ValidityScope::Base));
        assert!(is_valid(&q, ValidityScope::Full));
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let mut q = question(QuestionType::ProblemSolving);
        q.text = "   ".to_string();
        assert!(!is_valid(&q, ValidityScope::Base));
    }

    #[test]
    fn test_too_few_options_rejected() {
        let mut q = question(QuestionType::ProblemSolving);
        q.options = options(&[("A", "only one")]);
        assert!(!is_valid(&q, ValidityScope::Base));

        // Blank option text doesn't count
        q.options = options(&[("A", "4"), ("B", "  ")]);
        assert!(!is_valid(&q, ValidityScope::Base));
    }

    #[test]
    fn test_answer_must_match_an_option_label() {
        let mut q = question(QuestionType::ProblemSolving);
        q.correct_answer = Some("E".to_string());
        assert!(!is_valid(&q, ValidityScope::Base));

        q.correct_answer = None;
        assert!(!is_valid(&q, ValidityScope::Base));
    }

    #[test]
    fn test_data_sufficiency_needs_both_statements() {
        let mut q = question(QuestionType::DataSufficiency);
        q.text = "Is x even? (1) x is divisible by 4. (2) x > 0.".to_string();
        assert!(is_valid(&q, ValidityScope::Full));

        q.text = "Is x even? (1) x is divisible by 4.".to_string();
        assert!(!is_valid(&q, ValidityScope::Full));
        // Still fine at base scope
        assert!(is_valid(&q, ValidityScope::Base));
    }

    #[test]
    fn test_reading_comprehension_needs_passage_context() {
        let mut q = question(QuestionType::ReadingComprehension);
        assert!(!is_valid(&q, ValidityScope::Full));
        assert!(is_valid(&q, ValidityScope::Base));

        q.passage_id = Some(Uuid::new_v4());
        q.passage_text = Some("The industrial revolution began...".to_string());
        q.sequence_in_passage = Some(1);
        assert!(is_valid(&q, ValidityScope::Full));

        q.passage_text = Some("  ".to_string());
        assert!(!is_valid(&q, ValidityScope::Full));
    }

    #[test]
    fn test_critical_reasoning_needs_argument_text() {
        let mut q = question(QuestionType::CriticalReasoning);
        assert!(!is_valid(&q, ValidityScope::Full));
        assert!(is_valid(&q, ValidityScope::Base));

        q.passage_text = Some("The mayor claims the new bridge cut commutes.".to_string());
        assert!(is_valid(&q, ValidityScope::Full));
    }

    #[test]
    fn test_problem_solving_has_no_extra_rules() {
        let q = question(QuestionType::ProblemSolving);
        assert!(is_valid(&q, ValidityScope::Full));
    }
}
