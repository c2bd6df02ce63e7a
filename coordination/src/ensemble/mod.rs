//! Jury of independent critics.
//!
//! ```text
//!                    ┌─▶ judge 1 ─┐
//!   Plan (N groups) ─┼─▶ judge 2 ─┼─▶ ballots [K × N] ──▶ per-group majority ──▶ Vec<bool>
//!                    └─▶ judge K ─┘
//! ```
//!
//! # Components
//!
//! - **Jury**: fans one plan out to K judge calls and reduces the ballots
//! - **voting**: pure ballot arithmetic (threshold, tallies)

pub mod jury;
pub mod voting;

pub use jury::{Jury, JuryVerdict};
pub use voting::{majority_threshold, GroupTally};
