//! Repair loop for structurally invalid agent solutions.
//!
//! 1. Verify every pending agent
//! 2. Valid agents leave the loop with their plan
//! 3. Each invalid agent gets its correction appended, answers again and is
//!    re-extracted (all invalid agents concurrently)
//! 4. Repeat until none are invalid or the attempt cap is hit; agents still
//!    invalid at the cap are dropped

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::debate::{AgentContext, DebateOutcome, Extractor};
use crate::error::{SolverError, SolverResult};
use crate::gateway::{CallPolicy, CallStage, SharedGateway};
use crate::puzzle::{AgentSolution, Plan, WordUniverse};
use crate::verifier::{CheckOutcome, Verifier};

/// One pass of corrections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairAttempt {
    /// 1-indexed.
    pub attempt: u32,
    pub timestamp: DateTime<Utc>,
    pub invalid_agents: Vec<usize>,
}

/// An agent whose solution passed verification.
#[derive(Debug, Clone)]
pub struct RepairedAgent {
    pub context: AgentContext,
    pub plan: Plan,
}

#[derive(Debug, Clone)]
pub struct RepairResult {
    /// Valid agents in agent-index order.
    pub valid: Vec<RepairedAgent>,
    pub dropped: Vec<usize>,
    pub attempts: Vec<RepairAttempt>,
    pub corrections_sent: usize,
}

/// Bounded repair of agents whose solutions fail verification.
pub struct CorrectionLoop {
    gateway: SharedGateway,
    extractor: Extractor,
    policy: CallPolicy,
    max_attempts: u32,
}

impl CorrectionLoop {
    /// Create a loop that gives up after `max_attempts` correction passes.
    pub fn new(
        gateway: SharedGateway,
        extractor: Extractor,
        policy: CallPolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            gateway,
            extractor,
            policy,
            max_attempts,
        }
    }

    /// Repair `outcome` until every agent is valid or dropped.
    pub async fn run(
        &self,
        outcome: DebateOutcome,
        universe: &WordUniverse,
    ) -> SolverResult<RepairResult> {
        let mut pending: Vec<(AgentContext, AgentSolution)> =
            outcome.agents.into_iter().zip(outcome.solutions).collect();
        let mut valid = Vec::new();
        let mut dropped = Vec::new();
        let mut attempts = Vec::new();
        let mut corrections_sent = 0;

        loop {
            let solutions: Vec<AgentSolution> = pending.iter().map(|(_, s)| s.clone()).collect();
            let report = Verifier::check(&solutions, universe);

            let mut invalid = Vec::new();
            for ((context, _), check) in pending.drain(..).zip(report.checks) {
                match check.outcome {
                    CheckOutcome::Valid(plan) => valid.push(RepairedAgent { context, plan }),
                    CheckOutcome::Invalid { kind, correction } => {
                        info!(agent = context.index, %kind, "agent solution invalid");
                        invalid.push((context, correction));
                    }
                }
            }

            if invalid.is_empty() {
                break;
            }
            if attempts.len() as u32 >= self.max_attempts {
                for (context, _) in &invalid {
                    warn!(agent = context.index, cap = self.max_attempts, "dropping agent after repair cap");
                    dropped.push(context.index);
                }
                break;
            }

            attempts.push(RepairAttempt {
                attempt: attempts.len() as u32 + 1,
                timestamp: Utc::now(),
                invalid_agents: invalid.iter().map(|(c, _)| c.index).collect(),
            });
            corrections_sent += invalid.len();
            pending = self.repair(invalid).await?;
        }

        valid.sort_by_key(|agent| agent.context.index);
        if valid.is_empty() {
            return Err(SolverError::RetriesExhausted {
                stage: CallStage::Repair.as_str(),
                attempts: attempts.len() as u32,
            });
        }

        Ok(RepairResult {
            valid,
            dropped,
            attempts,
            corrections_sent,
        })
    }

    async fn repair(
        &self,
        invalid: Vec<(AgentContext, String)>,
    ) -> SolverResult<Vec<(AgentContext, AgentSolution)>> {
        let mut join_set: JoinSet<(AgentContext, SolverResult<AgentSolution>)> = JoinSet::new();
        for (mut context, correction) in invalid {
            let gateway = self.gateway.clone();
            let extractor = self.extractor.clone();
            let policy = self.policy;
            join_set.spawn(async move {
                context.conversation.push_user(correction);
                let result = match context
                    .take_turn(gateway.as_ref(), CallStage::Repair, &policy)
                    .await
                {
                    Ok(answer) => {
                        let answer = answer.to_string();
                        extractor.extract(&answer).await
                    }
                    Err(e) => Err(e.into()),
                };
                (context, result)
            });
        }

        let mut repaired = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((context, Ok(solution))) => repaired.push((context, solution)),
                Ok((context, Err(SolverError::RetriesExhausted { .. }))) => {
                    warn!(agent = context.index, "re-extraction failed, agent stays invalid");
                    repaired.push((context, AgentSolution::default()));
                }
                Ok((_, Err(e))) => return Err(e),
                Err(e) => warn!(error = %e, "repair task panicked"),
            }
        }
        repaired.sort_by_key(|(context, _)| context.index);
        Ok(repaired)
    }
}
