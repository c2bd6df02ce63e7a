//! Generate-judge-regenerate planning.
//!
//! ```text
//!   generate full plan ──▶ jury
//!        all pass ─────────────────────────────▶ Accepted
//!        ≤ 1 pass ─────────────────────────────▶ Discarded (NoConsensus)
//!        otherwise: keep passing groups
//!                   regenerate leftover words ──▶ jury
//!                        all pass ──▶ combine + re-validate ──▶ Accepted
//!                        else ─────────────────▶ Discarded (RegenerationExhausted)
//! ```
//!
//! Discarded attempts come back with the negative examples they produced;
//! the driver feeds them into the next attempt.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{PartialFailurePolicy, ReplanConfig, SolverConfig};
use crate::engine::RoundSolver;
use crate::ensemble::{Jury, JuryVerdict};
use crate::error::{SolverError, SolverResult};
use crate::gateway::{ask_json, CallPolicy, CallStage, Conversation, ModelRole, SharedGateway};
use crate::judge::{attempt_in_order, GroundTruthJudge, RoundOutcome};
use crate::prompts;
use crate::puzzle::{
    FailedGroup, FailureSource, GameState, Group, NegativeExampleSet, Plan, PlanValidator,
    WordUniverse,
};

/// Result of one `generate_plan` call.
#[derive(Debug)]
pub enum PlanAttempt {
    Accepted(Plan),
    Discarded {
        cause: SolverError,
        learned: NegativeExampleSet,
    },
}

/// A jury-approved plan plus everything learned while finding it.
#[derive(Debug, Clone)]
pub struct ReplanOutcome {
    pub plan: Plan,
    pub learned: NegativeExampleSet,
    pub attempts: u32,
}

/// Replan strategy: one plan, a jury verdict, and regeneration of the
/// words the jury rejected.
pub struct Replanner {
    gateway: SharedGateway,
    jury: Jury,
    policy: CallPolicy,
    config: ReplanConfig,
}

impl Replanner {
    /// Create a replanner with its own jury.
    pub fn new(gateway: SharedGateway, config: &SolverConfig) -> SolverResult<Self> {
        let policy = CallPolicy::from_config(&config.retry);
        let jury = Jury::new(gateway.clone(), config.jury.judges, policy)?;
        Ok(Self {
            gateway,
            jury,
            policy,
            config: config.replan.clone(),
        })
    }

    /// Keep generating until a plan is accepted or the attempt cap is hit.
    pub async fn plan(
        &self,
        universe: &WordUniverse,
        memory: &NegativeExampleSet,
    ) -> SolverResult<ReplanOutcome> {
        let mut context = memory.clone();
        let mut learned = NegativeExampleSet::new();

        for attempt in 1..=self.config.max_plan_attempts {
            match self.generate_plan(universe, &context).await {
                Ok(PlanAttempt::Accepted(plan)) => {
                    info!(attempt, "plan accepted");
                    return Ok(ReplanOutcome {
                        plan,
                        learned,
                        attempts: attempt,
                    });
                }
                Ok(PlanAttempt::Discarded {
                    cause,
                    learned: new,
                }) => {
                    warn!(attempt, cause = %cause, "plan discarded");
                    context.extend(new.clone());
                    learned.extend(new);
                }
                Err(e @ SolverError::RetriesExhausted { .. }) => {
                    warn!(attempt, error = %e, "plan generation gave up");
                }
                Err(e) => return Err(e),
            }
        }

        Err(SolverError::RetriesExhausted {
            stage: "replan",
            attempts: self.config.max_plan_attempts,
        })
    }

    /// One full generate, judge and (maybe) regenerate pass.
    pub async fn generate_plan(
        &self,
        universe: &WordUniverse,
        memory: &NegativeExampleSet,
    ) -> SolverResult<PlanAttempt> {
        let mut conversation = Conversation::new();
        conversation.push_system(prompts::plan_frame());
        if let Some(context) = prompts::failed_plans_context(memory, universe) {
            conversation.push_system(context);
        }
        conversation.push_user(prompts::plan_request(universe));
        let plan = self
            .structured_plan(&mut conversation, CallStage::PlanGeneration, universe)
            .await?;

        let verdict = self.jury.verdict(&plan).await?;
        if verdict.all_passed() {
            return Ok(PlanAttempt::Accepted(plan));
        }

        let passed = verdict.passed_count();
        if passed <= 1 {
            let mut learned = NegativeExampleSet::new();
            learned.record_plan(plan.groups.clone());
            record_rejected(&mut learned, &plan, &verdict);
            return Ok(PlanAttempt::Discarded {
                cause: SolverError::NoConsensus {
                    passed,
                    total: plan.len(),
                },
                learned,
            });
        }

        let (kept, rejected) = split_by_verdict(&plan, &verdict);
        let leftover = universe.without(kept.iter());
        info!(
            kept = kept.len(),
            leftover = leftover.len(),
            "regenerating leftover words"
        );

        let regenerated = self.regenerate(&leftover, memory).await;
        let failure = match regenerated {
            Ok((regen, regen_verdict)) if regen_verdict.all_passed() => {
                let mut groups = kept;
                groups.extend(regen.groups);
                let candidates: Vec<_> = groups.iter().map(Group::to_candidate).collect();
                match PlanValidator::validate(&candidates, universe) {
                    Ok(combined) => return Ok(PlanAttempt::Accepted(combined)),
                    Err(e) => {
                        warn!(error = %e, "combined plan failed validation");
                        None
                    }
                }
            }
            Ok((regen, regen_verdict)) => Some((regen, regen_verdict)),
            Err(e @ SolverError::RetriesExhausted { .. }) => {
                warn!(error = %e, "regeneration produced no usable plan");
                None
            }
            Err(e) => return Err(e),
        };

        let mut learned = NegativeExampleSet::new();
        match self.config.partial_failure_policy {
            PartialFailurePolicy::DiscardWholePlan => {
                learned.record_plan(plan.groups.clone());
                record_groups(&mut learned, rejected);
            }
            PartialFailurePolicy::KeepPassingGroups => {
                record_groups(&mut learned, rejected);
                if let Some((regen, regen_verdict)) = &failure {
                    record_rejected(&mut learned, regen, regen_verdict);
                }
            }
        }
        Ok(PlanAttempt::Discarded {
            cause: SolverError::RegenerationExhausted {
                leftover: leftover.len(),
            },
            learned,
        })
    }

    async fn regenerate(
        &self,
        leftover: &WordUniverse,
        memory: &NegativeExampleSet,
    ) -> SolverResult<(Plan, JuryVerdict)> {
        let mut conversation = Conversation::new();
        conversation.push_system(prompts::regeneration_frame());
        if let Some(context) = prompts::failed_plans_context(memory, leftover) {
            conversation.push_system(context);
        }
        conversation.push_user(prompts::plan_request(leftover));
        let regen = self
            .structured_plan(&mut conversation, CallStage::Regeneration, leftover)
            .await?;
        let verdict = self.jury.verdict(&regen).await?;
        Ok((regen, verdict))
    }

    async fn structured_plan(
        &self,
        conversation: &mut Conversation,
        stage: CallStage,
        universe: &WordUniverse,
    ) -> SolverResult<Plan> {
        let policy = CallPolicy {
            max_malformed_retries: self.config.max_generation_attempts.saturating_sub(1),
            ..self.policy
        };
        ask_json(
            self.gateway.as_ref(),
            conversation,
            stage,
            ModelRole::Solver,
            &policy,
            prompts::PLAN_CORRECTION,
            |value| PlanValidator::validate_value(value, universe).map_err(|e| e.to_string()),
        )
        .await
    }
}

fn split_by_verdict(plan: &Plan, verdict: &JuryVerdict) -> (Vec<Group>, Vec<Group>) {
    let (kept, rejected): (Vec<_>, Vec<_>) = plan
        .groups
        .iter()
        .cloned()
        .zip(verdict.accepted())
        .partition(|(_, passed)| *passed);
    (
        kept.into_iter().map(|(g, _)| g).collect(),
        rejected.into_iter().map(|(g, _)| g).collect(),
    )
}

fn record_rejected(memory: &mut NegativeExampleSet, plan: &Plan, verdict: &JuryVerdict) {
    let (_, rejected) = split_by_verdict(plan, verdict);
    record_groups(memory, rejected);
}

fn record_groups(memory: &mut NegativeExampleSet, groups: Vec<Group>) {
    for group in groups {
        memory.record_group(FailedGroup::new(group, FailureSource::Jury));
    }
}

#[async_trait]
impl RoundSolver for Replanner {
    fn name(&self) -> &'static str {
        "replan"
    }

    async fn play_round(
        &mut self,
        state: &GameState,
        judge: &mut dyn GroundTruthJudge,
    ) -> SolverResult<RoundOutcome> {
        let ReplanOutcome { plan, learned, .. } =
            self.plan(&state.words_remaining, &state.memory).await?;
        let mut outcome =
            attempt_in_order(plan.groups, &state.words_remaining, &state.memory, judge).await?;
        outcome.learned = learned;
        Ok(outcome)
    }
}
