//! Multi-agent debate.
//!
//! ```text
//!  round 0:   agent_0 ─┐   agent_1 ─┐   agent_2 ─┐      (independent answers)
//!             join ◀───┴────────────┴────────────┘
//!  round r:   agent_i ◀── peers' latest answers + "reconsider"
//!             join
//!  extract:   answer_i ──▶ {"<LABEL>": [w1..w4], ...} ──▶ AgentSolution_i
//! ```
//!
//! After the debate, [`consensus::merge`] folds the agents' ranked groups
//! into one global candidate order.

pub mod consensus;
pub mod extraction;
pub mod orchestrator;
pub mod state;

pub use consensus::{merge, CandidateScore};
pub use extraction::Extractor;
pub use orchestrator::{Debate, DebateOutcome};
pub use state::{AgentContext, DebatePhase};
