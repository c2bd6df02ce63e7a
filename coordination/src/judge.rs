//! Ground-truth boundary and the greedy attempt executor.
//!
//! The judge is whatever reveals whether a submitted group is correct: a
//! human at a terminal, a browser driver, or an answer key. Each rejected
//! submission costs one mistake.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{SolverError, SolverResult};
use crate::puzzle::{Group, GroupKey, NegativeExampleSet, Word, WordUniverse, GROUP_SIZE};

/// Label used for the forced final group when no agent proposed it.
pub const REMAINING_LABEL: &str = "REMAINING WORDS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JudgeError {
    #[error("judge input closed")]
    Closed,

    #[error("judge I/O failed: {0}")]
    Io(String),
}

/// Reveals whether a group is one of the puzzle's answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroundTruthJudge: Send {
    async fn submit(&mut self, group: &Group) -> Result<bool, JudgeError>;
}

/// Judge backed by the known answer groups of a puzzle.
#[derive(Debug, Clone)]
pub struct AnswerKeyJudge {
    answers: BTreeSet<GroupKey>,
    submissions: Vec<(GroupKey, bool)>,
}

impl AnswerKeyJudge {
    /// Create a judge from the puzzle's answer groups.
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Group>,
    {
        Self {
            answers: answers.into_iter().map(|g| g.key()).collect(),
            submissions: Vec::new(),
        }
    }

    pub fn submissions(&self) -> &[(GroupKey, bool)] {
        &self.submissions
    }
}

#[async_trait]
impl GroundTruthJudge for AnswerKeyJudge {
    async fn submit(&mut self, group: &Group) -> Result<bool, JudgeError> {
        let key = group.key();
        let correct = self.answers.contains(&key);
        self.submissions.push((key, correct));
        Ok(correct)
    }
}

/// What one round achieved against the judge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub confirmed: Vec<Group>,
    /// The single rejection that ended the round, if any.
    pub rejected: Option<Group>,
    /// Negative examples learned during the round without the judge.
    #[serde(default, skip_serializing_if = "NegativeExampleSet::is_empty")]
    pub learned: NegativeExampleSet,
    pub submissions: usize,
}

/// Submit candidates in order until the board is cleared or one is
/// rejected.
///
/// Candidates touching an already-confirmed word, using a word off the
/// board, or already rejected by the judge are skipped. When exactly four
/// words are left unconfirmed and no remaining candidate covers them, that
/// forced group is submitted under [`REMAINING_LABEL`].
pub async fn attempt_in_order<I>(
    candidates: I,
    universe: &WordUniverse,
    memory: &NegativeExampleSet,
    judge: &mut dyn GroundTruthJudge,
) -> SolverResult<RoundOutcome>
where
    I: IntoIterator<Item = Group>,
{
    let mut outcome = RoundOutcome::default();
    let mut remaining = universe.clone();

    for candidate in candidates {
        if remaining.is_empty() {
            break;
        }
        if candidate.words().iter().any(|w| !remaining.contains(w)) {
            continue;
        }
        if memory.judge_rejected(&candidate.key()) {
            continue;
        }
        if submit(judge, &candidate, &mut outcome).await? {
            remaining = remaining.without(std::iter::once(&candidate));
            outcome.confirmed.push(candidate);
        } else {
            outcome.rejected = Some(candidate);
            return Ok(outcome);
        }
    }

    if remaining.len() == GROUP_SIZE {
        let forced = forced_group(&remaining)?;
        if memory.judge_rejected(&forced.key()) {
            warn!(group = %forced, "forced group was already rejected");
        } else if submit(judge, &forced, &mut outcome).await? {
            outcome.confirmed.push(forced);
        } else {
            outcome.rejected = Some(forced);
        }
    }

    if outcome.submissions == 0 {
        return Err(SolverError::NoEligibleGroup);
    }
    Ok(outcome)
}

async fn submit(
    judge: &mut dyn GroundTruthJudge,
    group: &Group,
    outcome: &mut RoundOutcome,
) -> SolverResult<bool> {
    outcome.submissions += 1;
    let correct = judge.submit(group).await?;
    info!(group = %group, correct, "judge verdict");
    Ok(correct)
}

fn forced_group(remaining: &WordUniverse) -> SolverResult<Group> {
    let words: Vec<Word> = remaining.iter().cloned().collect();
    Group::new(REMAINING_LABEL, words).ok_or(SolverError::NoEligibleGroup)
}
