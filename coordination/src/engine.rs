//! Game loop: owns the [`GameState`] and drives a round solver to a win or
//! a loss.
//!
//! ```text
//!   GameState ──(&)──▶ RoundSolver::play_round ──▶ RoundOutcome
//!       ▲                                              │
//!       └──── confirm / record_mistake / remember ◀────┘
//! ```
//!
//! State is mutated only here, between rounds. A round that fails without
//! reaching the judge costs no mistake but still counts toward the round
//! cap, so every game terminates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::baseline::DirectSolver;
use crate::config::{SolverConfig, StrategyKind};
use crate::error::{SolverError, SolverResult};
use crate::gateway::SharedGateway;
use crate::judge::{GroundTruthJudge, RoundOutcome};
use crate::orchestrator::RoundOrchestrator;
use crate::puzzle::{GameOutcome, GameState, Group, WordUniverse};
use crate::replanner::Replanner;

/// One round of play against the judge.
#[async_trait]
pub trait RoundSolver: Send {
    fn name(&self) -> &'static str;

    async fn play_round(
        &mut self,
        state: &GameState,
        judge: &mut dyn GroundTruthJudge,
    ) -> SolverResult<RoundOutcome>;
}

/// Per-round telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub confirmed: Vec<Group>,
    pub rejected: Option<Group>,
    pub submissions: usize,
    /// Set when the round ended in a recoverable error.
    pub error: Option<String>,
    pub error_category: Option<String>,
}

/// Everything about a finished game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub game_id: Uuid,
    pub strategy: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: GameOutcome,
    pub rounds: Vec<RoundRecord>,
    pub final_state: GameState,
}

/// Owns the game state and drives a [`RoundSolver`] until the game ends.
pub struct GameEngine {
    solver: Box<dyn RoundSolver>,
    max_mistakes: u32,
    max_rounds: u32,
}

impl GameEngine {
    /// Create an engine around an already built solver.
    pub fn new(solver: Box<dyn RoundSolver>, max_mistakes: u32, max_rounds: u32) -> Self {
        Self {
            solver,
            max_mistakes,
            max_rounds,
        }
    }

    /// Validate `config` and build the configured strategy over `gateway`.
    pub fn from_config(config: &SolverConfig, gateway: SharedGateway) -> SolverResult<Self> {
        config.validate()?;
        let solver = build_solver(config, gateway)?;
        Ok(Self::new(solver, config.max_mistakes, config.max_rounds))
    }

    pub fn strategy(&self) -> &'static str {
        self.solver.name()
    }

    /// Play one game on `board` against `judge`.
    pub async fn play(
        &mut self,
        board: WordUniverse,
        judge: &mut dyn GroundTruthJudge,
    ) -> SolverResult<GameReport> {
        let game_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = GameState::new(board, self.max_mistakes);
        let mut rounds = Vec::new();

        info!(%game_id, strategy = self.solver.name(), words = state.words_remaining.len(), "game started");

        let mut round = 0u32;
        while !state.is_terminal() && round < self.max_rounds {
            round += 1;
            let span = info_span!("round", round, mistakes = state.mistakes_made);
            let round_started = Utc::now();
            let clock = std::time::Instant::now();

            let result = self
                .solver
                .play_round(&state, judge)
                .instrument(span)
                .await;

            let mut record = RoundRecord {
                round,
                started_at: round_started,
                elapsed_ms: clock.elapsed().as_millis() as u64,
                confirmed: Vec::new(),
                rejected: None,
                submissions: 0,
                error: None,
                error_category: None,
            };

            match result {
                Ok(outcome) => {
                    record.confirmed = outcome.confirmed.clone();
                    record.rejected = outcome.rejected.clone();
                    record.submissions = outcome.submissions;
                    apply(&mut state, outcome);
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!(round, error = %e, category = %e.retry_category(), "round ended without a verdict");
                    record.error = Some(e.to_string());
                    record.error_category = Some(e.retry_category().to_string());
                }
            }

            info!(
                round,
                correct = state.groups_correct,
                mistakes = state.mistakes_made,
                remaining = state.words_remaining.len(),
                "round finished"
            );
            rounds.push(record);
        }

        let outcome = state.outcome().unwrap_or(GameOutcome::Loss);
        if state.outcome().is_none() {
            warn!(rounds = round, "round cap reached before the game ended");
        }
        info!(%game_id, %outcome, rounds = round, "game finished");

        Ok(GameReport {
            game_id,
            strategy: self.solver.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            outcome,
            rounds,
            final_state: state,
        })
    }
}

/// Build the solver named by `config.strategy`.
pub fn build_solver(
    config: &SolverConfig,
    gateway: SharedGateway,
) -> SolverResult<Box<dyn RoundSolver>> {
    let solver: Box<dyn RoundSolver> = match config.strategy {
        StrategyKind::Debate => Box::new(RoundOrchestrator::new(gateway, config)?),
        StrategyKind::Replan => Box::new(Replanner::new(gateway, config)?),
        StrategyKind::Direct => Box::new(DirectSolver::new(gateway, config)),
    };
    Ok(solver)
}

fn apply(state: &mut GameState, outcome: RoundOutcome) {
    for group in outcome.confirmed {
        state.confirm(group);
    }
    if let Some(rejected) = outcome.rejected {
        state.record_mistake(rejected);
    }
    state.remember(outcome.learned);
}

/// Errors that end the game instead of the round: the gateway or judge is
/// unusable, or the setup is wrong.
fn is_fatal(err: &SolverError) -> bool {
    matches!(
        err,
        SolverError::Gateway(_) | SolverError::Judge(_) | SolverError::Configuration(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{attempt_in_order, AnswerKeyJudge};
    use crate::puzzle::fixtures;
    use std::collections::VecDeque;

    /// Plays a fixed script of candidate lists, one per round.
    struct ScriptedSolver {
        rounds: VecDeque<SolverResult<Vec<Group>>>,
    }

    #[async_trait]
    impl RoundSolver for ScriptedSolver {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn play_round(
            &mut self,
            state: &GameState,
            judge: &mut dyn GroundTruthJudge,
        ) -> SolverResult<RoundOutcome> {
            let candidates = self
                .rounds
                .pop_front()
                .unwrap_or_else(|| Ok(fixtures::solution()))?;
            attempt_in_order(candidates, &state.words_remaining, &state.memory, judge).await
        }
    }

    fn engine(rounds: Vec<SolverResult<Vec<Group>>>, max_rounds: u32) -> GameEngine {
        GameEngine::new(
            Box::new(ScriptedSolver {
                rounds: rounds.into(),
            }),
            4,
            max_rounds,
        )
    }

    #[tokio::test]
    async fn test_win_in_one_round() {
        let mut judge = AnswerKeyJudge::new(fixtures::solution());
        let report = engine(vec![Ok(fixtures::solution())], 12)
            .play(fixtures::universe(), &mut judge)
            .await
            .unwrap();
        assert_eq!(report.outcome, GameOutcome::Win);
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.final_state.mistakes_made, 0);
        assert_eq!(report.strategy, "scripted");
    }

    #[tokio::test]
    async fn test_mistake_then_win() {
        let s = fixtures::solution();
        let wrong = Group::new("WRONG", ["WAX", "CLAY", "PAPYRUS", "GIFT"]).unwrap();
        let mut judge = AnswerKeyJudge::new(s.clone());
        let report = engine(vec![Ok(vec![s[2].clone(), wrong]), Ok(s.clone())], 12)
            .play(fixtures::universe(), &mut judge)
            .await
            .unwrap();
        assert_eq!(report.outcome, GameOutcome::Win);
        assert_eq!(report.final_state.mistakes_made, 1);
        assert_eq!(report.rounds[0].confirmed.len(), 1);
        assert!(report.rounds[0].rejected.is_some());
        assert_eq!(report.final_state.failed_groups().len(), 1);
    }

    #[tokio::test]
    async fn test_four_mistakes_lose() {
        let wrong = |label: &str, w: [&str; 4]| Group::new(label, w).unwrap();
        let mut judge = AnswerKeyJudge::new(fixtures::solution());
        let report = engine(
            vec![
                Ok(vec![wrong("A", ["WAX", "CLAY", "PAPYRUS", "GIFT"])]),
                Ok(vec![wrong("B", ["WAX", "CLAY", "PAPYRUS", "HOST"])]),
                Ok(vec![wrong("C", ["WAX", "CLAY", "PAPYRUS", "FLAIR"])]),
                Ok(vec![wrong("D", ["WAX", "CLAY", "PAPYRUS", "MUMMY"])]),
            ],
            12,
        )
        .play(fixtures::universe(), &mut judge)
        .await
        .unwrap();
        assert_eq!(report.outcome, GameOutcome::Loss);
        assert_eq!(report.final_state.mistakes_made, 4);
        assert_eq!(report.rounds.len(), 4);
    }

    #[tokio::test]
    async fn test_recoverable_round_error_costs_no_mistake() {
        let mut judge = AnswerKeyJudge::new(fixtures::solution());
        let report = engine(
            vec![
                Err(SolverError::RetriesExhausted {
                    stage: "repair",
                    attempts: 3,
                }),
                Ok(fixtures::solution()),
            ],
            12,
        )
        .play(fixtures::universe(), &mut judge)
        .await
        .unwrap();
        assert_eq!(report.outcome, GameOutcome::Win);
        assert_eq!(report.final_state.mistakes_made, 0);
        assert_eq!(report.rounds[0].error_category.as_deref(), Some("exhausted"));
    }

    #[tokio::test]
    async fn test_round_cap_ends_in_loss() {
        let mut judge = AnswerKeyJudge::new(fixtures::solution());
        let failures = (0..3).map(|_| Err(SolverError::NoEligibleGroup)).collect();
        let report = engine(failures, 3)
            .play(fixtures::universe(), &mut judge)
            .await
            .unwrap();
        assert_eq!(report.outcome, GameOutcome::Loss);
        assert_eq!(report.rounds.len(), 3);
        assert_eq!(report.final_state.mistakes_made, 0);
    }

    #[test]
    fn test_from_config_picks_strategy() {
        let gateway = crate::gateway::testing::ScriptedGateway::new(|_| Ok(String::new()));
        for (kind, name) in [
            (StrategyKind::Debate, "debate"),
            (StrategyKind::Replan, "replan"),
            (StrategyKind::Direct, "direct"),
        ] {
            let config = SolverConfig {
                strategy: kind,
                ..SolverConfig::default()
            };
            let engine = GameEngine::from_config(&config, gateway.clone()).unwrap();
            assert_eq!(engine.strategy(), name);
        }

        let mut broken = SolverConfig::default();
        broken.debate.agents = 0;
        assert!(matches!(
            GameEngine::from_config(&broken, gateway).map(|_| ()),
            Err(SolverError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_gateway_error_is_fatal() {
        let mut judge = AnswerKeyJudge::new(fixtures::solution());
        let err = engine(
            vec![Err(SolverError::Gateway(
                crate::gateway::GatewayError::MissingCredentials,
            ))],
            12,
        )
        .play(fixtures::universe(), &mut judge)
        .await
        .unwrap_err();
        assert!(matches!(err, SolverError::Gateway(_)));
    }
}
