//! Structural legality of a proposed partition.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. structure: a list of single-key `{label: [words]}` objects
//! 2. group count: `|universe| / 4`
//! 3. group size: exactly four distinct words
//! 4. membership: every word is in the universe
//! 5. overlap: no word in two groups (pairwise)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CandidateGroup, Group, Plan, Word, WordUniverse, GROUP_SIZE};

/// Why a candidate partition is not a legal plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed plan structure: {0}")]
    MalformedStructure(String),

    #[error("expected {expected} groups, got {actual}")]
    WrongGroupCount { expected: usize, actual: usize },

    #[error("group '{label}' has {size} distinct words, expected 4")]
    WrongGroupSize { label: String, size: usize },

    #[error("group '{label}' uses {word}, which is not an available word")]
    WordNotInUniverse { label: String, word: Word },

    #[error("groups '{first}' and '{second}' share {shared:?}")]
    OverlappingGroups {
        first: String,
        second: String,
        shared: Vec<Word>,
    },
}

/// Discriminant of [`ValidationError`], for logging and tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    MalformedStructure,
    WrongGroupCount,
    WrongGroupSize,
    WordNotInUniverse,
    OverlappingGroups,
}

impl std::fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedStructure => write!(f, "malformed_structure"),
            Self::WrongGroupCount => write!(f, "wrong_group_count"),
            Self::WrongGroupSize => write!(f, "wrong_group_size"),
            Self::WordNotInUniverse => write!(f, "word_not_in_universe"),
            Self::OverlappingGroups => write!(f, "overlapping_groups"),
        }
    }
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        match self {
            Self::MalformedStructure(_) => ValidationKind::MalformedStructure,
            Self::WrongGroupCount { .. } => ValidationKind::WrongGroupCount,
            Self::WrongGroupSize { .. } => ValidationKind::WrongGroupSize,
            Self::WordNotInUniverse { .. } => ValidationKind::WordNotInUniverse,
            Self::OverlappingGroups { .. } => ValidationKind::OverlappingGroups,
        }
    }
}

/// Pure validator for plans and agent solutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanValidator;

impl PlanValidator {
    /// Parse the `{"groups": [{label: [words]}, ...]}` wire shape.
    pub fn parse_plan(value: &Value) -> Result<Vec<CandidateGroup>, ValidationError> {
        let groups = value
            .get("groups")
            .ok_or_else(|| ValidationError::MalformedStructure("missing 'groups' key".into()))?
            .as_array()
            .ok_or_else(|| ValidationError::MalformedStructure("'groups' is not a list".into()))?;

        groups
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_single_key_group(i, entry))
            .collect()
    }

    /// Validate the raw wire shape against `universe`.
    pub fn validate_value(value: &Value, universe: &WordUniverse) -> Result<Plan, ValidationError> {
        let candidates = Self::parse_plan(value)?;
        Self::validate(&candidates, universe)
    }

    /// Validate already-parsed candidates against `universe`.
    pub fn validate(
        candidates: &[CandidateGroup],
        universe: &WordUniverse,
    ) -> Result<Plan, ValidationError> {
        let expected = universe.group_count();
        if candidates.len() != expected {
            return Err(ValidationError::WrongGroupCount {
                expected,
                actual: candidates.len(),
            });
        }

        let mut sets: Vec<BTreeSet<&Word>> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let distinct: BTreeSet<&Word> = candidate.words.iter().collect();
            if candidate.words.len() != GROUP_SIZE || distinct.len() != GROUP_SIZE {
                let size = if candidate.words.len() == GROUP_SIZE {
                    distinct.len()
                } else {
                    candidate.words.len()
                };
                return Err(ValidationError::WrongGroupSize {
                    label: candidate.label.clone(),
                    size,
                });
            }
            sets.push(distinct);
        }

        for candidate in candidates {
            if let Some(word) = candidate.words.iter().find(|w| !universe.contains(w)) {
                return Err(ValidationError::WordNotInUniverse {
                    label: candidate.label.clone(),
                    word: word.clone(),
                });
            }
        }

        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                let shared: Vec<Word> = sets[i]
                    .intersection(&sets[j])
                    .map(|w| (*w).clone())
                    .collect();
                if !shared.is_empty() {
                    return Err(ValidationError::OverlappingGroups {
                        first: candidates[i].label.clone(),
                        second: candidates[j].label.clone(),
                        shared,
                    });
                }
            }
        }

        let groups = candidates
            .iter()
            .map(|c| {
                Group::new(c.label.clone(), c.words.iter().cloned()).ok_or_else(|| {
                    ValidationError::WrongGroupSize {
                        label: c.label.clone(),
                        size: c.words.len(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Plan { groups })
    }
}

fn parse_single_key_group(index: usize, entry: &Value) -> Result<CandidateGroup, ValidationError> {
    let object = entry.as_object().ok_or_else(|| {
        ValidationError::MalformedStructure(format!("group {} is not an object", index))
    })?;
    if object.len() != 1 {
        return Err(ValidationError::MalformedStructure(format!(
            "group {} has {} keys, expected exactly one label",
            index,
            object.len()
        )));
    }
    let (label, words) = object.iter().next().ok_or_else(|| {
        ValidationError::MalformedStructure(format!("group {} is empty", index))
    })?;
    let words = words.as_array().ok_or_else(|| {
        ValidationError::MalformedStructure(format!("group '{}' words are not a list", label))
    })?;
    let words = words
        .iter()
        .map(|w| {
            w.as_str().map(Word::new).ok_or_else(|| {
                ValidationError::MalformedStructure(format!(
                    "group '{}' contains a non-string word",
                    label
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CandidateGroup {
        label: label.clone(),
        words,
    })
}
