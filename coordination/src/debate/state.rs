//! Per-agent debate state.

use serde::{Deserialize, Serialize};

use crate::gateway::{ask_text, CallPolicy, CallStage, CompletionGateway, Conversation, GatewayError, ModelRole};

/// One debate participant: its private conversation and the raw answer it
/// gave in each turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContext {
    pub index: usize,
    pub conversation: Conversation,
    pub answers: Vec<String>,
}

impl AgentContext {
    pub fn new(index: usize, frame: &str, question: &str) -> Self {
        Self {
            index,
            conversation: Conversation::seeded(frame, question),
            answers: Vec::new(),
        }
    }

    pub fn latest_answer(&self) -> Option<&str> {
        self.answers.last().map(String::as_str)
    }

    /// Ask the solver model to answer the conversation as it stands and
    /// record the reply.
    pub async fn take_turn(
        &mut self,
        gateway: &dyn CompletionGateway,
        stage: CallStage,
        policy: &CallPolicy,
    ) -> Result<&str, GatewayError> {
        let reply = ask_text(gateway, &mut self.conversation, stage, ModelRole::Solver, policy).await?;
        self.answers.push(reply);
        Ok(self.answers.last().map(String::as_str).unwrap_or_default())
    }
}

/// Debate progress, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    Opening,
    Exchange { round: usize },
    Extraction,
    Complete,
}

impl DebatePhase {
    pub fn for_round(round: usize) -> Self {
        if round == 0 {
            Self::Opening
        } else {
            Self::Exchange { round }
        }
    }
}

impl std::fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opening => write!(f, "opening"),
            Self::Exchange { round } => write!(f, "exchange_{}", round),
            Self::Extraction => write!(f, "extraction"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{fast_policy, ScriptedGateway};

    #[tokio::test]
    async fn test_take_turn_records_answer() {
        let gateway = ScriptedGateway::new(|_| Ok("**A**: [W, X, Y, Z]".into()));
        let mut agent = AgentContext::new(0, "frame", "question");
        assert_eq!(agent.latest_answer(), None);
        agent
            .take_turn(gateway.as_ref(), CallStage::Debate, &fast_policy())
            .await
            .unwrap();
        assert_eq!(agent.latest_answer(), Some("**A**: [W, X, Y, Z]"));
        assert_eq!(agent.conversation.len(), 3);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(DebatePhase::for_round(0).to_string(), "opening");
        assert_eq!(DebatePhase::for_round(2).to_string(), "exchange_2");
    }
}
