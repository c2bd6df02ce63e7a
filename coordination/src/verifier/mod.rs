//! Per-agent structural check with repair instructions.
//!
//! Runs the plan validator over each agent's label-keyed solution. Every
//! failing agent gets a natural-language correction aimed at the first
//! broken rule, to be appended to that agent's own conversation.

use serde::{Deserialize, Serialize};

use crate::prompts::ANSWER_FORMAT;
use crate::puzzle::validator::ValidationKind;
use crate::puzzle::{AgentSolution, Plan, PlanValidator, ValidationError, Word, WordUniverse};

/// Result for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCheck {
    pub agent: usize,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Valid(Plan),
    Invalid {
        kind: ValidationKind,
        correction: String,
    },
}

/// Checks for a batch of agents, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierReport {
    pub checks: Vec<AgentCheck>,
}

impl VerifierReport {
    pub fn validity_flags(&self) -> Vec<bool> {
        self.checks
            .iter()
            .map(|c| matches!(c.outcome, CheckOutcome::Valid(_)))
            .collect()
    }

    /// Correction per agent; `None` for valid agents.
    pub fn correction_messages(&self) -> Vec<Option<&str>> {
        self.checks
            .iter()
            .map(|c| match &c.outcome {
                CheckOutcome::Valid(_) => None,
                CheckOutcome::Invalid { correction, .. } => Some(correction.as_str()),
            })
            .collect()
    }

    pub fn all_valid(&self) -> bool {
        self.validity_flags().into_iter().all(|ok| ok)
    }

    pub fn invalid_count(&self) -> usize {
        self.validity_flags().into_iter().filter(|ok| !ok).count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier;

impl Verifier {
    pub fn check(solutions: &[AgentSolution], universe: &WordUniverse) -> VerifierReport {
        let checks = solutions
            .iter()
            .enumerate()
            .map(|(agent, solution)| AgentCheck {
                agent,
                outcome: Self::check_one(solution, universe),
            })
            .collect();
        VerifierReport { checks }
    }

    pub fn check_one(solution: &AgentSolution, universe: &WordUniverse) -> CheckOutcome {
        match PlanValidator::validate(&solution.groups, universe) {
            Ok(plan) => CheckOutcome::Valid(plan),
            Err(err) => CheckOutcome::Invalid {
                kind: err.kind(),
                correction: correction_message(&err, universe),
            },
        }
    }
}

/// Repair instruction for the first rule `err` reports.
pub fn correction_message(err: &ValidationError, universe: &WordUniverse) -> String {
    let problem = match err {
        ValidationError::MalformedStructure(detail) => format!(
            "Your answer could not be read as a list of themed groups ({}).",
            detail
        ),
        ValidationError::WrongGroupCount { expected, actual } => format!(
            "You gave {} groups, but the {} words on the board must be split into exactly {} groups of four.",
            actual,
            universe.len(),
            expected
        ),
        ValidationError::WrongGroupSize { label, size } => format!(
            "Your group '{}' has {} different words. Every group needs exactly four different words.",
            label, size
        ),
        ValidationError::WordNotInUniverse { label, word } => format!(
            "Your group '{}' uses {}, which is not on the board. Only these words are available: {}.",
            label,
            word,
            universe.to_prompt_list()
        ),
        ValidationError::OverlappingGroups {
            first,
            second,
            shared,
        } => format!(
            "Your groups '{}' and '{}' both use {}. Each word belongs to exactly one group.",
            first,
            second,
            join_words(shared)
        ),
    };
    format!(
        "{} Fix this and give your complete corrected answer. {}",
        problem, ANSWER_FORMAT
    )
}

fn join_words(words: &[Word]) -> String {
    words.iter().map(Word::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{fixtures, CandidateGroup};

    fn valid_solution() -> AgentSolution {
        AgentSolution::new(fixtures::solution().iter().map(|g| g.to_candidate()).collect())
    }

    #[test]
    fn test_valid_agents_get_no_correction() {
        let report = Verifier::check(&[valid_solution()], &fixtures::universe());
        assert_eq!(report.validity_flags(), vec![true]);
        assert_eq!(report.correction_messages(), vec![None]);
        assert!(report.all_valid());
    }

    #[test]
    fn test_overlap_correction_names_both_groups() {
        let mut bad = valid_solution();
        bad.groups[2] = CandidateGroup::new("KNACK", ["FLAIR", "TALENT", "INSTINCT", "GIFT"]);
        let report = Verifier::check(&[valid_solution(), bad], &fixtures::universe());
        assert_eq!(report.validity_flags(), vec![true, false]);
        assert_eq!(report.invalid_count(), 1);
        let message = report.correction_messages()[1].unwrap();
        assert!(message.contains("'EMCEE' and 'KNACK' both use GIFT"));
        assert!(message.contains("**THEME**"));
    }

    #[test]
    fn test_illegal_word_correction_lists_board() {
        let mut bad = valid_solution();
        bad.groups[0] = CandidateGroup::new("WRITING SURFACES", ["WAX", "CLAY", "PAPYRUS", "SLATE"]);
        match Verifier::check_one(&bad, &fixtures::universe()) {
            CheckOutcome::Invalid { kind, correction } => {
                assert_eq!(kind, ValidationKind::WordNotInUniverse);
                assert!(correction.contains("SLATE"));
                assert!(correction.contains("\"PARCHMENT\""));
            }
            CheckOutcome::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_wrong_count_correction() {
        let mut bad = valid_solution();
        bad.groups.pop();
        let report = Verifier::check(&[bad], &fixtures::universe());
        let message = report.correction_messages()[0].unwrap();
        assert!(message.starts_with("You gave 3 groups"));
        assert!(message.contains("exactly 4 groups"));
    }
}
