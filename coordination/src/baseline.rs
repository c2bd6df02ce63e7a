//! Single-conversation strategy.
//!
//! One persistent conversation across the whole game. Each round asks for a
//! confidence-ordered plan of the remaining words and submits it in order;
//! a rejected group is reported back on the next round.

use async_trait::async_trait;
use tracing::info;

use crate::config::SolverConfig;
use crate::engine::RoundSolver;
use crate::error::SolverResult;
use crate::gateway::{ask_json, CallPolicy, CallStage, Conversation, ModelRole, SharedGateway};
use crate::judge::{attempt_in_order, GroundTruthJudge, RoundOutcome};
use crate::prompts;
use crate::puzzle::{GameState, Group, PlanValidator};

/// Single-conversation solver that is told which group the judge rejected.
pub struct DirectSolver {
    gateway: SharedGateway,
    policy: CallPolicy,
    conversation: Conversation,
    last_rejected: Option<Group>,
}

impl DirectSolver {
    /// Create a solver with an empty conversation.
    pub fn new(gateway: SharedGateway, config: &SolverConfig) -> Self {
        Self {
            gateway,
            policy: CallPolicy::from_config(&config.retry),
            conversation: Conversation::new(),
            last_rejected: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}

#[async_trait]
impl RoundSolver for DirectSolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn play_round(
        &mut self,
        state: &GameState,
        judge: &mut dyn GroundTruthJudge,
    ) -> SolverResult<RoundOutcome> {
        let universe = &state.words_remaining;
        if self.conversation.is_empty() {
            self.conversation.push_system(prompts::direct_frame());
        }
        self.conversation
            .push_user(prompts::direct_request(universe, self.last_rejected.as_ref()));

        let plan = ask_json(
            self.gateway.as_ref(),
            &mut self.conversation,
            CallStage::Direct,
            ModelRole::Solver,
            &self.policy,
            prompts::PLAN_CORRECTION,
            |value| PlanValidator::validate_value(value, universe).map_err(|e| e.to_string()),
        )
        .await?;
        info!(groups = plan.len(), "direct plan ready");

        let outcome = attempt_in_order(plan.groups, universe, &state.memory, judge).await?;
        self.last_rejected = outcome.rejected.clone();
        Ok(outcome)
    }
}
