//! Fallback cascade for scarce candidate pools
//!
//! When a type's first pass under-delivers, constraints are relaxed in
//! a fixed order, never all at once. Questions already chosen stay
//! excluded at every stage, so a fallback can only add, never repeat.

use super::QuizRequest;
use crate::engine::validity::ValidityScope;
use crate::repo::CandidateFilter;
use qprep_common::db::models::QuestionType;

/// Relaxation stages, applied in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    /// Drop caller narrowing (category, difficulty); keep the type and
    /// full validity
    WidenWithinType,
    /// Keep the type; relax to base validity
    RelaxValidity,
    /// Any permitted type at base validity, still honoring an explicit
    /// type list from the caller
    CrossType,
}

impl FallbackStage {
    pub const ORDER: [FallbackStage; 3] = [
        FallbackStage::WidenWithinType,
        FallbackStage::RelaxValidity,
        FallbackStage::CrossType,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FallbackStage::WidenWithinType => "widen-within-type",
            FallbackStage::RelaxValidity => "relax-validity",
            FallbackStage::CrossType => "cross-type",
        }
    }
}

/// First-pass filter: requested type, caller narrowing, full validity.
pub fn first_pass_filter(question_type: QuestionType, request: &QuizRequest) -> CandidateFilter {
    CandidateFilter {
        question_type: Some(question_type),
        types: None,
        category: request.category,
        difficulty: request.difficulty,
        scope: ValidityScope::Full,
    }
}

/// Candidate filter for a fallback stage, or `None` when the stage
/// cannot add anything for this type.
pub fn stage_filter(
    stage: FallbackStage,
    question_type: QuestionType,
    request: &QuizRequest,
) -> Option<CandidateFilter> {
    match stage {
        FallbackStage::WidenWithinType => {
            // Without caller narrowing this stage equals the first pass
            if request.category.is_none() && request.difficulty.is_none() {
                return None;
            }
            Some(CandidateFilter {
                question_type: Some(question_type),
                types: None,
                category: None,
                difficulty: None,
                scope: ValidityScope::Full,
            })
        }
        FallbackStage::RelaxValidity => Some(CandidateFilter {
            question_type: Some(question_type),
            types: None,
            category: None,
            difficulty: None,
            scope: ValidityScope::Base,
        }),
        FallbackStage::CrossType => {
            let allowed = cross_type_pool(request);
            if allowed.is_empty() {
                return None;
            }
            Some(CandidateFilter {
                question_type: None,
                types: Some(allowed),
                category: None,
                difficulty: None,
                scope: ValidityScope::Base,
            })
        }
    }
}

/// Types the cross-type stage may draw from: the caller's explicit list
/// (or all types), minus passage-grouped ones. Passage members are only
/// ever served through the grouper; sampling them loose would split
/// their passage.
fn cross_type_pool(request: &QuizRequest) -> Vec<QuestionType> {
    QuestionType::ALL
        .into_iter()
        .filter(|qt| !qt.is_passage_grouped())
        .filter(|qt| match &request.types {
            Some(types) => types.contains(qt),
            None => true,
        })
        .collect()
}
