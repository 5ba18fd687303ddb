//! Passage grouping and greedy group selection
//!
//! Reading comprehension questions are only served together with the
//! rest of their passage. Candidates are bucketed by passage, ranked,
//! and taken a whole group at a time; a group is split only when the
//! overall requested count would otherwise be exceeded, and then as a
//! prefix in passage order.

use qprep_common::db::models::Question;
use uuid::Uuid;

/// One passage with its selectable members, ordered for display.
#[derive(Debug, Clone)]
pub struct PassageGroup {
    pub passage_id: Uuid,
    /// Members in `sequence_in_passage` order
    pub questions: Vec<Question>,
}

/// Bucket candidates by passage and rank the resulting groups.
///
/// Groups smaller than `min_size` are dropped entirely; serving one or
/// two stray members of a passage reads as broken context. Ranking is
/// size descending, then newest member first, then passage id so equal
/// groups order the same way on every call.
pub fn build_groups(candidates: Vec<Question>, min_size: usize) -> Vec<PassageGroup> {
    let mut groups: Vec<PassageGroup> = Vec::new();

    for question in candidates {
        let Some(passage_id) = question.passage_id else {
            // Loose rows can reach here at base validity scope; they
            // cannot be grouped, so they cannot be served
            continue;
        };
        match groups.iter_mut().find(|g| g.passage_id == passage_id) {
            Some(group) => group.questions.push(question),
            None => groups.push(PassageGroup {
                passage_id,
                questions: vec![question],
            }),
        }
    }

    // Presentation order: passage sequence when present; unsequenced
    // members sort after, hardest first, then newest
    for group in &mut groups {
        group.questions.sort_by(|a, b| {
            let a_seq = a.sequence_in_passage.unwrap_or(i64::MAX);
            let b_seq = b.sequence_in_passage.unwrap_or(i64::MAX);
            a_seq
                .cmp(&b_seq)
                .then_with(|| b.difficulty.cmp(&a.difficulty))
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    groups.retain(|g| g.questions.len() >= min_size);

    groups.sort_by(|a, b| {
        b.questions
            .len()
            .cmp(&a.questions.len())
            .then_with(|| {
                let a_newest = a.questions.iter().map(|q| q.created_at).max();
                let b_newest = b.questions.iter().map(|q| q.created_at).max();
                b_newest.cmp(&a_newest)
            })
            .then_with(|| a.passage_id.cmp(&b.passage_id))
    });

    groups
}

/// Greedily take whole groups until `target` is met or groups run out.
///
/// Each group contributes at most `max_per_group` members (a prefix in
/// passage order). `hard_cap` is the room left in the overall quiz: a
/// whole group may overshoot `target`, but never `hard_cap` — the last
/// group is truncated to fit instead.
pub fn select_from_groups(
    groups: &[PassageGroup],
    target: usize,
    hard_cap: usize,
    max_per_group: usize,
) -> Vec<Question> {
    let mut selected: Vec<Question> = Vec::new();

    for group in groups {
        if selected.len() >= target || selected.len() >= hard_cap {
            break;
        }

        let mut take = group.questions.len().min(max_per_group);
        if selected.len() + take > hard_cap {
            take = hard_cap - selected.len();
        }
        if take == 0 {
            break;
        }

        selected.extend(group.questions.iter().take(take).cloned());
    }

    selected
}
