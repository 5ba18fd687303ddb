//! Per-type target planning
//!
//! Turns a requested question count into per-type targets before any
//! database access. Targets are rounded up, so they may sum past the
//! requested count; the selection loop stops at the overall count and
//! later types absorb the difference.

use qprep_common::db::models::QuestionType;

/// Default mix when the caller names no types, in percent.
///
/// Planning order is fixed: passage-grouped first, then the remaining
/// types, so the passage grouper always sees the most room.
pub const DEFAULT_MIX_PERCENT: [(QuestionType, u64); 4] = [
    (QuestionType::ReadingComprehension, 30),
    (QuestionType::CriticalReasoning, 20),
    (QuestionType::DataSufficiency, 25),
    (QuestionType::ProblemSolving, 25),
];

/// One planned selection target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTarget {
    pub question_type: QuestionType,
    pub target: usize,
}

/// Compute per-type targets for a request.
///
/// With an explicit type list the count splits evenly across the named
/// types (duplicates ignored); otherwise the default mix applies. Both
/// paths round up, never down.
///
/// # Examples
/// ```
/// use qprep_common::db::models::QuestionType;
/// use qprep_qa::engine::plan::plan_targets;
///
/// // 20 questions, default mix: 6 RC + 4 CR + 5 DS + 5 PS
/// let targets = plan_targets(20, None);
/// assert_eq!(targets.len(), 4);
/// assert_eq!(targets[0].question_type, QuestionType::ReadingComprehension);
/// assert_eq!(targets[0].target, 6);
///
/// // Explicit types split evenly, rounded up
/// let targets = plan_targets(9, Some(&[QuestionType::ProblemSolving, QuestionType::DataSufficiency]));
/// assert!(targets.iter().all(|t| t.target == 5));
/// ```
pub fn plan_targets(count: usize, explicit: Option<&[QuestionType]>) -> Vec<TypeTarget> {
    match explicit {
        Some(types) => {
            // Preserve canonical order, drop duplicates
            let requested: Vec<QuestionType> = QuestionType::ALL
                .into_iter()
                .filter(|qt| types.contains(qt))
                .collect();
            let per_type = ceil_div(count, requested.len().max(1));
            requested
                .into_iter()
                .map(|question_type| TypeTarget {
                    question_type,
                    target: per_type,
                })
                .collect()
        }
        None => DEFAULT_MIX_PERCENT
            .into_iter()
            .map(|(question_type, percent)| TypeTarget {
                question_type,
                target: ceil_percent(count, percent),
            })
            .collect(),
    }
}

fn ceil_div(numerator: usize, denominator: usize) -> usize {
    (numerator + denominator - 1) / denominator
}

fn ceil_percent(count: usize, percent: u64) -> usize {
    let scaled = count as u64 * percent;
    ((scaled + 99) / 100) as usize
}
