//! Final ordering of selected questions
//!
//! Non-passage questions are shuffled; the passage block keeps its
//! internal order (groups contiguous, members in passage sequence) and
//! is placed at the start, middle, or end of the shuffled remainder
//! with equal probability.

use qprep_common::db::models::Question;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockPosition {
    Start,
    Middle,
    End,
}

/// Arrange selected questions into their served order.
pub fn arrange<R: Rng>(questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    let (block, mut rest): (Vec<Question>, Vec<Question>) = questions
        .into_iter()
        .partition(|q| q.question_type.is_passage_grouped());

    rest.shuffle(rng);

    if block.is_empty() {
        return rest;
    }
    if rest.is_empty() {
        return block;
    }

    let position = match rng.gen_range(0..3) {
        0 => BlockPosition::Start,
        1 => BlockPosition::Middle,
        _ => BlockPosition::End,
    };

    // A middle placement needs enough remainder to flank the block on
    // both sides; otherwise fall back to one of the edges
    let position = if position == BlockPosition::Middle && rest.len() <= 2 {
        if rng.gen_bool(0.5) {
            BlockPosition::Start
        } else {
            BlockPosition::End
        }
    } else {
        position
    };

    match position {
        BlockPosition::Start => {
            let mut arranged = block;
            arranged.extend(rest);
            arranged
        }
        BlockPosition::Middle => {
            let mut arranged = Vec::with_capacity(block.len() + rest.len());
            let split = rest.len() / 2;
            let tail = rest.split_off(split);
            arranged.extend(rest);
            arranged.extend(block);
            arranged.extend(tail);
            arranged
        }
        BlockPosition::End => {
            let mut arranged = rest;
            arranged.extend(block);
            arranged
        }
    }
}
