//! Connections puzzle solving by multi-agent consensus.
//!
//! Three strategies play a game of sixteen words against a ground-truth
//! judge:
//!
//! - `debate`: N agents answer, read each other and revise; invalid answers
//!   are repaired, each agent ranks its groups, and the merged ranking is
//!   submitted greedily ([`orchestrator`])
//! - `replan`: one plan is generated and checked by a K-judge jury; groups
//!   the jury rejects are regenerated from the leftover words ([`replanner`])
//! - `direct`: a single conversation that is told which group was wrong
//!   ([`baseline`])
//!
//! All model traffic goes through the [`gateway::CompletionGateway`] trait,
//! so every strategy can be driven by a scripted gateway in tests.
//!
//! # Usage
//!
//! ```no_run
//! # async fn run() -> coordination::SolverResult<()> {
//! use std::sync::Arc;
//! use coordination::{AnswerKeyJudge, GameEngine, OpenAiGateway, SolverConfig, WordUniverse};
//!
//! let config = SolverConfig::load(None)?;
//! let gateway = Arc::new(OpenAiGateway::from_config(&config.gateway)?);
//! let mut engine = GameEngine::from_config(&config, gateway)?;
//! let board = WordUniverse::new(["WAX", "CLAY" /* ... */]).map_err(|e| {
//!     coordination::SolverError::Configuration(e.to_string())
//! })?;
//! let mut judge = AnswerKeyJudge::new(Vec::new());
//! let report = engine.play(board, &mut judge).await?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod baseline;
pub mod config;
pub mod debate;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod feedback;
pub mod gateway;
pub mod judge;
pub mod orchestrator;
pub mod prompts;
pub mod puzzle;
pub mod ranker;
pub mod replanner;
pub mod verifier;

pub use baseline::DirectSolver;
pub use config::{PartialFailurePolicy, SolverConfig, StrategyKind};
pub use engine::{build_solver, GameEngine, GameReport, RoundRecord, RoundSolver};
pub use error::{RetryCategory, SolverError, SolverResult};
pub use gateway::openai::OpenAiGateway;
pub use gateway::{
    CallStage, CompletionGateway, CompletionRequest, GatewayError, ModelRole, SharedGateway,
};
pub use judge::{AnswerKeyJudge, GroundTruthJudge, JudgeError, RoundOutcome, REMAINING_LABEL};
pub use orchestrator::{ConsensusRound, RoundOrchestrator};
pub use puzzle::{
    GameOutcome, GameState, Group, NegativeExampleSet, Plan, PlanValidator, Word, WordUniverse,
};
pub use replanner::{PlanAttempt, Replanner, ReplanOutcome};
