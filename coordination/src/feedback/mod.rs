//! Structural feedback for debate agents.
//!
//! ```text
//! AgentSolution* → Verifier → correction → agent conversation → re-extract
//!                     ↑                                             |
//!                     └─────────────────────────────────────────────┘
//! ```

pub mod correction_loop;

pub use correction_loop::{CorrectionLoop, RepairAttempt, RepairResult, RepairedAgent};
