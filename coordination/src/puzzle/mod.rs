//! Puzzle domain model: words, groups, plans and agent solutions.
//!
//! ```text
//! WordUniverse ──▶ CandidateGroup* ──validate──▶ Plan (Vec<Group>)
//!                      ▲                              │
//!      AgentSolution ──┘                              └─▶ GroupKey (sorted words)
//! ```
//!
//! Everything produced by the completion gateway enters as a
//! `CandidateGroup` (unchecked). Only the validator constructs `Group`
//! values from candidates, so a `Group` always holds four distinct words.

pub mod memory;
pub mod state;
pub mod validator;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use memory::{FailedGroup, FailureSource, NegativeExampleSet};
pub use state::{GameOutcome, GameState};
pub use validator::{PlanValidator, ValidationError};

/// Number of words in every group.
pub const GROUP_SIZE: usize = 4;

/// An uppercase word token from the board.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(String);

impl Word {
    /// Normalize a raw token: trimmed and uppercased.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Word {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Error building a word universe from raw board input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("board has {0} words, expected a non-zero multiple of 4")]
    BadSize(usize),

    #[error("duplicate word on board: {0}")]
    Duplicate(Word),
}

/// The set of words still in play.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordUniverse {
    words: BTreeSet<Word>,
}

impl WordUniverse {
    /// Build a universe, rejecting duplicates and sizes that are not a
    /// multiple of the group size.
    pub fn new<I, S>(raw: I) -> Result<Self, UniverseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = BTreeSet::new();
        for token in raw {
            let word = Word::new(token);
            if !words.insert(word.clone()) {
                return Err(UniverseError::Duplicate(word));
            }
        }
        if words.is_empty() || words.len() % GROUP_SIZE != 0 {
            return Err(UniverseError::BadSize(words.len()));
        }
        Ok(Self { words })
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// How many groups a full partition of this universe has.
    pub fn group_count(&self) -> usize {
        self.words.len() / GROUP_SIZE
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }

    /// Words not covered by any of `used`.
    pub fn without<'a, I>(&self, used: I) -> Self
    where
        I: IntoIterator<Item = &'a Group>,
    {
        let mut words = self.words.clone();
        for group in used {
            for word in group.words() {
                words.remove(word);
            }
        }
        Self { words }
    }

    /// Render as a bracketed, quoted list for prompts.
    pub fn to_prompt_list(&self) -> String {
        let quoted: Vec<String> = self.words.iter().map(|w| format!("\"{}\"", w)).collect();
        format!("[{}]", quoted.join(", "))
    }
}

/// Order-independent identity of a group: its words, sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey([Word; GROUP_SIZE]);

impl GroupKey {
    pub fn words(&self) -> &[Word; GROUP_SIZE] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self.0.iter().map(Word::as_str).collect();
        write!(f, "{}", words.join("|"))
    }
}

/// A validated group: four distinct words and a category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    words: [Word; GROUP_SIZE],
}

impl Group {
    /// Build a group, returning `None` unless exactly four distinct words
    /// are given.
    pub fn new<I, W>(label: impl Into<String>, words: I) -> Option<Self>
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        let words: Vec<Word> = words.into_iter().map(Into::into).collect();
        let distinct: BTreeSet<&Word> = words.iter().collect();
        if distinct.len() != GROUP_SIZE || words.len() != GROUP_SIZE {
            return None;
        }
        let words: [Word; GROUP_SIZE] = words.try_into().ok()?;
        Some(Self {
            label: label.into(),
            words,
        })
    }

    pub fn words(&self) -> &[Word; GROUP_SIZE] {
        &self.words
    }

    /// Canonical key; equal for the same four words under any label or order.
    pub fn key(&self) -> GroupKey {
        let mut sorted = self.words.clone();
        sorted.sort();
        GroupKey(sorted)
    }

    pub fn contains(&self, word: &Word) -> bool {
        self.words.contains(word)
    }

    /// Whether any word is shared with `other`.
    pub fn intersects(&self, other: &Group) -> bool {
        self.words.iter().any(|w| other.contains(w))
    }

    pub fn to_candidate(&self) -> CandidateGroup {
        CandidateGroup {
            label: self.label.clone(),
            words: self.words.to_vec(),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self.words.iter().map(Word::as_str).collect();
        write!(f, "{}: [{}]", self.label, words.join(", "))
    }
}

/// An unchecked group as produced by the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateGroup {
    pub label: String,
    pub words: Vec<Word>,
}

impl CandidateGroup {
    pub fn new<I, W>(label: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<Word>,
    {
        Self {
            label: label.into(),
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Single-key `{label: [words]}` object used by the plan wire shape.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(
            self.label.clone(),
            serde_json::Value::from(
                self.words
                    .iter()
                    .map(|w| w.as_str().to_string())
                    .collect::<Vec<_>>(),
            ),
        );
        serde_json::Value::Object(map)
    }
}

/// A structurally valid partition of a universe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub groups: Vec<Group>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `{"groups": [{label: [words]}, ...]}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "groups": self
                .groups
                .iter()
                .map(|g| g.to_candidate().to_json())
                .collect::<Vec<_>>()
        })
    }

    pub fn candidates(&self) -> Vec<CandidateGroup> {
        self.groups.iter().map(Group::to_candidate).collect()
    }
}

/// One debate participant's answer, keyed by category label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentSolution {
    pub groups: Vec<CandidateGroup>,
}

impl AgentSolution {
    pub fn new(groups: Vec<CandidateGroup>) -> Self {
        Self { groups }
    }

    /// Build from a JSON object mapping label to a word list. Labels are
    /// unique by construction; non-string entries are rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut groups = Vec::with_capacity(object.len());
        for (label, words) in object {
            let words = words.as_array()?;
            let words: Option<Vec<Word>> =
                words.iter().map(|w| w.as_str().map(Word::new)).collect();
            groups.push(CandidateGroup {
                label: label.clone(),
                words: words?,
            });
        }
        Some(Self { groups })
    }

    /// Render as `**label**: [w1, w2, w3, w4]` lines.
    pub fn to_prompt_lines(&self) -> String {
        self.groups
            .iter()
            .map(|g| {
                let words: Vec<&str> = g.words.iter().map(Word::as_str).collect();
                format!("**{}**: [{}]", g.label, words.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A group placed at a confidence rank by one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedGroup {
    /// 1 = most confident.
    pub rank: u32,
    pub group: Group,
}

/// One agent's groups ordered by its own confidence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankedSolution {
    pub groups: Vec<RankedGroup>,
    /// Set when the ranking fell back to the agent's own order.
    pub degraded: bool,
}

impl RankedSolution {
    /// Rank groups in the given order (1-based).
    pub fn in_order(groups: Vec<Group>) -> Self {
        Self {
            groups: groups
                .into_iter()
                .enumerate()
                .map(|(i, group)| RankedGroup {
                    rank: i as u32 + 1,
                    group,
                })
                .collect(),
            degraded: false,
        }
    }
}
