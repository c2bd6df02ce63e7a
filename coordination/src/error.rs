//! Solver error taxonomy with retry classification.
//!
//! | Category        | Retriable | Raised by                                    |
//! |-----------------|-----------|----------------------------------------------|
//! | Transient       | yes       | gateway transport failures, timeouts         |
//! | MalformedOutput | yes       | missing keys / wrong JSON shape              |
//! | Structural      | yes       | validator failures (repair by correction)    |
//! | Discard         | yes       | jury rejected the plan, regeneration failed  |
//! | Exhausted       | no        | a bounded retry loop ran out                 |
//! | Logic           | no        | invariant broken, bad configuration          |

use std::fmt;

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::judge::JudgeError;
use crate::puzzle::ValidationError;

/// Result alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Coarse classification used to decide whether a failure may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    Transient,
    MalformedOutput,
    Structural,
    Discard,
    Exhausted,
    Logic,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            Self::Transient | Self::MalformedOutput | Self::Structural | Self::Discard
        )
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::MalformedOutput => write!(f, "malformed_output"),
            Self::Structural => write!(f, "structural"),
            Self::Discard => write!(f, "discard"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Logic => write!(f, "logic"),
        }
    }
}

/// Every failure the solver can report.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Transport-level failure talking to the completion service.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The completion came back but not in the required shape.
    #[error("malformed {stage} output: {detail}")]
    MalformedGatewayOutput { stage: &'static str, detail: String },

    /// A plan or agent solution broke a structural rule.
    #[error("structurally invalid plan: {0}")]
    StructuralInvalid(#[from] ValidationError),

    /// Too few groups survived the jury to keep the plan.
    #[error("no consensus: {passed} of {total} groups passed the jury")]
    NoConsensus { passed: usize, total: usize },

    /// Regenerating the leftover words did not fully pass the jury.
    #[error("regeneration of {leftover} leftover words failed")]
    RegenerationExhausted { leftover: usize },

    /// A bounded retry loop gave up.
    #[error("{stage} gave up after {attempts} attempts")]
    RetriesExhausted { stage: &'static str, attempts: u32 },

    /// The ranked candidate list held nothing that could be tried.
    #[error("no eligible group left to attempt")]
    NoEligibleGroup,

    /// The ground-truth judge could not answer.
    #[error("judge error: {0}")]
    Judge(#[from] JudgeError),

    /// Configuration is invalid or missing required fields.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SolverError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Gateway(_) => RetryCategory::Transient,
            Self::MalformedGatewayOutput { .. } => RetryCategory::MalformedOutput,
            Self::StructuralInvalid(_) => RetryCategory::Structural,
            Self::NoConsensus { .. } | Self::RegenerationExhausted { .. } => {
                RetryCategory::Discard
            }
            Self::RetriesExhausted { .. } => RetryCategory::Exhausted,
            Self::NoEligibleGroup | Self::Configuration(_) => RetryCategory::Logic,
            Self::Judge(_) => RetryCategory::Transient,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }

    pub fn malformed(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedGatewayOutput {
            stage,
            detail: detail.into(),
        }
    }
}
