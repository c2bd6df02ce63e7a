//! One consensus round end-to-end.
//!
//! ```text
//! Debate ──▶ CorrectionLoop ──▶ Ranker (per agent, concurrent) ──▶ merge
//!                                                                   │
//!                               judge ◀── attempt_in_order ◀────────┘
//! ```

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::SolverConfig;
use crate::debate::{merge, CandidateScore, Debate};
use crate::engine::RoundSolver;
use crate::error::SolverResult;
use crate::feedback::{CorrectionLoop, RepairedAgent};
use crate::gateway::{CallPolicy, SharedGateway};
use crate::judge::{attempt_in_order, GroundTruthJudge, RoundOutcome};
use crate::puzzle::{GameState, RankedSolution};
use crate::ranker::Ranker;

/// Merged candidates of one round, before any judge submission.
#[derive(Debug, Clone)]
pub struct ConsensusRound {
    pub candidates: Vec<CandidateScore>,
    pub agents_used: usize,
    pub dropped_agents: Vec<usize>,
    pub corrections_sent: usize,
    pub degraded_rankings: usize,
}

/// Debate strategy: debate, repair, rank, merge, then submit.
pub struct RoundOrchestrator {
    debate: Debate,
    repair: CorrectionLoop,
    ranker: Ranker,
}

impl RoundOrchestrator {
    /// Create the debate pipeline from the debate and retry settings.
    pub fn new(gateway: SharedGateway, config: &SolverConfig) -> SolverResult<Self> {
        let policy = CallPolicy::from_config(&config.retry);
        let debate = Debate::new(
            gateway.clone(),
            config.debate.agents,
            config.debate.rounds,
            policy,
        )?;
        let repair = CorrectionLoop::new(
            gateway.clone(),
            debate.extractor().clone(),
            policy,
            config.retry.max_repair_attempts,
        );
        Ok(Self {
            debate,
            repair,
            ranker: Ranker::new(gateway, policy),
        })
    }

    /// Debate, repair, rank and merge over the current board.
    pub async fn consensus(&self, state: &GameState) -> SolverResult<ConsensusRound> {
        let universe = &state.words_remaining;
        let debate = self.debate.run(universe, &state.memory).await?;
        let repaired = self.repair.run(debate, universe).await?;
        if !repaired.dropped.is_empty() {
            warn!(dropped = ?repaired.dropped, "agents dropped after repair");
        }

        let agents_used = repaired.valid.len();
        let rankings = self.rank_all(repaired.valid).await?;
        let degraded_rankings = rankings.iter().filter(|r| r.degraded).count();
        let candidates = merge(&rankings);

        info!(
            agents = agents_used,
            candidates = candidates.len(),
            corrections = repaired.corrections_sent,
            degraded_rankings,
            "consensus ready"
        );
        Ok(ConsensusRound {
            candidates,
            agents_used,
            dropped_agents: repaired.dropped,
            corrections_sent: repaired.corrections_sent,
            degraded_rankings,
        })
    }

    async fn rank_all(&self, agents: Vec<RepairedAgent>) -> SolverResult<Vec<RankedSolution>> {
        let mut join_set: JoinSet<(usize, SolverResult<RankedSolution>)> = JoinSet::new();
        for mut agent in agents {
            let ranker = self.ranker.clone();
            join_set.spawn(async move {
                let ranked = ranker
                    .rank(&mut agent.context.conversation, &agent.plan)
                    .await;
                (agent.context.index, ranked)
            });
        }

        let mut rankings = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, ranked)) => rankings.push((index, ranked?)),
                Err(e) => warn!(error = %e, "ranking task panicked"),
            }
        }
        rankings.sort_by_key(|(index, _)| *index);
        Ok(rankings.into_iter().map(|(_, ranked)| ranked).collect())
    }
}

#[async_trait]
impl RoundSolver for RoundOrchestrator {
    fn name(&self) -> &'static str {
        "debate"
    }

    async fn play_round(
        &mut self,
        state: &GameState,
        judge: &mut dyn GroundTruthJudge,
    ) -> SolverResult<RoundOutcome> {
        let round = self.consensus(state).await?;
        attempt_in_order(
            round.candidates.into_iter().map(|c| c.group),
            &state.words_remaining,
            &state.memory,
            judge,
        )
        .await
    }
}
