//! Negative examples carried between generation calls.
//!
//! The set is only ever appended by the loop that owns it (the game engine
//! across rounds, a replanner drive within a round). Every generation call
//! takes it by shared reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Group, GroupKey};

/// Who rejected a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSource {
    /// The ground-truth judge said no. Counts as a mistake.
    Judge,
    /// A majority of jury critics voted the group down.
    Jury,
    /// Part of a plan that was discarded as a whole.
    DiscardedPlan,
}

impl std::fmt::Display for FailureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Judge => write!(f, "judge"),
            Self::Jury => write!(f, "jury"),
            Self::DiscardedPlan => write!(f, "discarded_plan"),
        }
    }
}

/// A group known not to be a correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedGroup {
    pub group: Group,
    pub source: FailureSource,
    pub recorded_at: DateTime<Utc>,
}

impl FailedGroup {
    pub fn new(group: Group, source: FailureSource) -> Self {
        Self {
            group,
            source,
            recorded_at: Utc::now(),
        }
    }
}

/// Accumulated failed groups and failed plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeExampleSet {
    failed_groups: Vec<FailedGroup>,
    failed_plans: Vec<Vec<Group>>,
}

impl NegativeExampleSet {
    /// Empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.failed_groups.is_empty() && self.failed_plans.is_empty()
    }

    pub fn failed_groups(&self) -> &[FailedGroup] {
        &self.failed_groups
    }

    pub fn failed_plans(&self) -> &[Vec<Group>] {
        &self.failed_plans
    }

    /// Record a failed group unless the same words are already recorded
    /// from the same source.
    pub fn record_group(&mut self, failed: FailedGroup) {
        let key = failed.group.key();
        let duplicate = self
            .failed_groups
            .iter()
            .any(|f| f.source == failed.source && f.group.key() == key);
        if !duplicate {
            self.failed_groups.push(failed);
        }
    }

    pub fn record_plan(&mut self, plan: Vec<Group>) {
        self.failed_plans.push(plan);
    }

    /// Append everything from `other`.
    pub fn extend(&mut self, other: NegativeExampleSet) {
        for failed in other.failed_groups {
            self.record_group(failed);
        }
        self.failed_plans.extend(other.failed_plans);
    }

    /// Whether the judge has already rejected exactly these words.
    pub fn judge_rejected(&self, key: &GroupKey) -> bool {
        self.failed_groups
            .iter()
            .any(|f| f.source == FailureSource::Judge && &f.group.key() == key)
    }

    /// Failed groups still fully on the board, for prompt context.
    pub fn groups_within<'a>(
        &'a self,
        universe: &'a super::WordUniverse,
    ) -> impl Iterator<Item = &'a FailedGroup> + 'a {
        self.failed_groups
            .iter()
            .filter(move |f| f.group.words().iter().all(|w| universe.contains(w)))
    }

    /// Prompt fragment listing known-bad groups, or `None` when there are none.
    pub fn describe_groups(&self, universe: &super::WordUniverse) -> Option<String> {
        let lines: Vec<String> = self
            .groups_within(universe)
            .map(|f| format!("- {} (rejected by {})", f.group, f.source))
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    /// Prompt fragment listing previously failed plans as JSON.
    pub fn describe_plans(&self) -> Option<String> {
        if self.failed_plans.is_empty() {
            return None;
        }
        let plans: Vec<serde_json::Value> = self
            .failed_plans
            .iter()
            .map(|plan| {
                serde_json::Value::from(
                    plan.iter()
                        .map(|g| g.to_candidate().to_json())
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        Some(serde_json::Value::from(plans).to_string())
    }
}
