//! Cumulative game state, owned by the game engine.

use serde::{Deserialize, Serialize};

use super::memory::{FailedGroup, FailureSource, NegativeExampleSet};
use super::{Group, WordUniverse};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Win,
    Loss,
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win => write!(f, "win"),
            Self::Loss => write!(f, "loss"),
        }
    }
}

/// Board progress plus the negative examples gathered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub words_remaining: WordUniverse,
    pub total_groups: usize,
    pub groups_correct: usize,
    pub mistakes_made: u32,
    pub max_mistakes: u32,
    pub solved: Vec<Group>,
    pub memory: NegativeExampleSet,
}

impl GameState {
    /// Fresh game on `board`.
    pub fn new(board: WordUniverse, max_mistakes: u32) -> Self {
        Self {
            total_groups: board.group_count(),
            words_remaining: board,
            groups_correct: 0,
            mistakes_made: 0,
            max_mistakes,
            solved: Vec::new(),
            memory: NegativeExampleSet::new(),
        }
    }

    /// Groups the judge rejected, oldest first.
    pub fn failed_groups(&self) -> Vec<&FailedGroup> {
        self.memory
            .failed_groups()
            .iter()
            .filter(|f| f.source == FailureSource::Judge)
            .collect()
    }

    /// `None` while the game is still running.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.groups_correct >= self.total_groups {
            Some(GameOutcome::Win)
        } else if self.mistakes_made >= self.max_mistakes {
            Some(GameOutcome::Loss)
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn mistakes_left(&self) -> u32 {
        self.max_mistakes.saturating_sub(self.mistakes_made)
    }

    /// Apply a judge-confirmed group.
    pub fn confirm(&mut self, group: Group) {
        self.words_remaining = self.words_remaining.without(std::iter::once(&group));
        self.groups_correct += 1;
        self.solved.push(group);
    }

    /// Apply a judge-rejected group.
    pub fn record_mistake(&mut self, group: Group) {
        self.mistakes_made += 1;
        self.memory
            .record_group(FailedGroup::new(group, FailureSource::Judge));
    }

    /// Merge negative examples gathered during a round.
    pub fn remember(&mut self, negatives: NegativeExampleSet) {
        self.memory.extend(negatives);
    }
}
