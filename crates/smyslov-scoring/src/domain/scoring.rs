//! Round scoring.
//!
//! Each answer is compared against every *other* player's answers:
//!
//! - `Sync`: scores when another player wrote the same answer anywhere.
//! - `Diff`: scores when no other player wrote it.
//! - `Express`: scores when another player wrote it at the same position.
//!
//! A player with exactly [`MAX_ANSWERS`] answers that all scored gets one
//! bonus point. Blank answers never score.

use std::collections::BTreeMap;

use serde::Serialize;
use smyslov_core::model::RoundType;

use super::answers::{MAX_ANSWERS, normalize};

/// One player's scored round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerScore {
    /// Normalized answers, truncated to [`MAX_ANSWERS`].
    pub answers: Vec<String>,
    /// Per-answer match flag, aligned with `answers`.
    pub scored: Vec<bool>,
    /// Number of scored answers.
    pub points: i32,
    /// Whether the perfect-round bonus applied.
    pub bonus: bool,
}

impl PlayerScore {
    /// Score change for the round.
    #[must_use]
    pub fn delta(&self) -> i32 {
        self.points + i32::from(self.bonus)
    }
}

/// Scores a round.
///
/// Pure and deterministic; `submissions` is not modified. Players missing
/// from `submissions` are simply not scored, and a player with an empty list
/// scores zero.
#[must_use]
pub fn score_round<K>(
    round_type: RoundType,
    submissions: &BTreeMap<K, Vec<String>>,
) -> BTreeMap<K, PlayerScore>
where
    K: Ord + Clone,
{
    let normalized: Vec<(&K, Vec<String>)> = submissions
        .iter()
        .map(|(key, answers)| {
            (
                key,
                answers
                    .iter()
                    .take(MAX_ANSWERS)
                    .map(|answer| normalize(answer))
                    .collect(),
            )
        })
        .collect();

    normalized
        .iter()
        .enumerate()
        .map(|(me, (key, answers))| {
            let others = || {
                normalized
                    .iter()
                    .enumerate()
                    .filter(move |(other, _)| *other != me)
                    .map(|(_, (_, theirs))| theirs)
            };
            let scored: Vec<bool> = answers
                .iter()
                .enumerate()
                .map(|(i, answer)| {
                    !answer.is_empty()
                        && match round_type {
                            RoundType::Sync => others().any(|theirs| theirs.contains(answer)),
                            RoundType::Diff => !others().any(|theirs| theirs.contains(answer)),
                            RoundType::Express => {
                                others().any(|theirs| theirs.get(i) == Some(answer))
                            }
                        }
                })
                .collect();
            let hits = scored.iter().filter(|&&hit| hit).count();
            let bonus = answers.len() == MAX_ANSWERS && hits == MAX_ANSWERS;
            (
                (*key).clone(),
                PlayerScore {
                    answers: answers.clone(),
                    scored,
                    points: i32::try_from(hits).unwrap_or(i32::MAX),
                    bonus,
                },
            )
        })
        .collect()
}
