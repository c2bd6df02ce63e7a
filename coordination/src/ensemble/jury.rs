//! K independent judgments of one plan.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::voting::{tally, GroupTally};
use crate::error::{SolverError, SolverResult};
use crate::gateway::structured::required_array;
use crate::gateway::{ask_json, CallPolicy, CallStage, Conversation, ModelRole, SharedGateway};
use crate::prompts;
use crate::puzzle::Plan;

/// Per-group outcome of a jury pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuryVerdict {
    pub tallies: Vec<GroupTally>,
}

impl JuryVerdict {
    /// Accept flags aligned with the plan's groups.
    pub fn accepted(&self) -> Vec<bool> {
        self.tallies.iter().map(GroupTally::passes).collect()
    }

    pub fn passed_count(&self) -> usize {
        self.tallies.iter().filter(|t| t.passes()).count()
    }

    /// True when every group reached the majority.
    pub fn all_passed(&self) -> bool {
        self.tallies.iter().all(GroupTally::passes)
    }
}

/// K independent critics voting on every group of a plan.
pub struct Jury {
    gateway: SharedGateway,
    judges: usize,
    policy: CallPolicy,
}

impl Jury {
    /// Create a jury of `judges` critics. Zero judges is a configuration error.
    pub fn new(gateway: SharedGateway, judges: usize, policy: CallPolicy) -> SolverResult<Self> {
        if judges == 0 {
            return Err(SolverError::Configuration(
                "a jury needs at least one judge".into(),
            ));
        }
        Ok(Self {
            gateway,
            judges,
            policy,
        })
    }

    pub fn judges(&self) -> usize {
        self.judges
    }

    /// Run all judges concurrently and reduce to per-group majority.
    pub async fn verdict(&self, plan: &Plan) -> SolverResult<JuryVerdict> {
        if plan.is_empty() {
            return Ok(JuryVerdict {
                tallies: Vec::new(),
            });
        }

        let ballots =
            try_join_all((0..self.judges).map(|judge| self.ballot(plan, judge))).await?;
        let verdict = JuryVerdict {
            tallies: tally(&ballots, plan.len()),
        };

        info!(
            groups = plan.len(),
            judges = self.judges,
            passed = verdict.passed_count(),
            "jury verdict"
        );
        Ok(verdict)
    }

    async fn ballot(&self, plan: &Plan, judge: usize) -> SolverResult<Vec<bool>> {
        let expected = plan.len();
        let mut conversation = Conversation::seeded(prompts::JURY_FRAME, prompts::jury_request(plan));
        let ballot = ask_json(
            self.gateway.as_ref(),
            &mut conversation,
            CallStage::Jury,
            ModelRole::Judge,
            &self.policy,
            &prompts::jury_correction(expected),
            |value| {
                let votes = required_array(value, "valid_bools")?
                    .iter()
                    .map(|v| v.as_bool().ok_or_else(|| "'valid_bools' holds a non-boolean".to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                if votes.len() != expected {
                    return Err(format!(
                        "expected {} booleans in 'valid_bools', got {}",
                        expected,
                        votes.len()
                    ));
                }
                Ok(votes)
            },
        )
        .await?;
        debug!(judge, ?ballot, "ballot");
        Ok(ballot)
    }
}
