//! Free-text answer to label-keyed JSON.
//!
//! Extraction only checks shape (an object of string lists). Whether the
//! groups are a legal partition is the verifier's job.

use crate::error::SolverResult;
use crate::gateway::{ask_json, CallPolicy, CallStage, Conversation, ModelRole, SharedGateway};
use crate::prompts;
use crate::puzzle::AgentSolution;

/// Turns free-text answers into [`AgentSolution`]s.
#[derive(Clone)]
pub struct Extractor {
    gateway: SharedGateway,
    policy: CallPolicy,
}

impl Extractor {
    pub fn new(gateway: SharedGateway, policy: CallPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Convert one raw answer. Each call uses a fresh conversation.
    pub async fn extract(&self, answer: &str) -> SolverResult<AgentSolution> {
        let mut conversation =
            Conversation::seeded(prompts::EXTRACTION_FRAME, prompts::extraction_request(answer));
        ask_json(
            self.gateway.as_ref(),
            &mut conversation,
            CallStage::Extraction,
            ModelRole::Extractor,
            &self.policy,
            prompts::EXTRACTION_CORRECTION,
            |value| {
                let solution = AgentSolution::from_json(value)
                    .ok_or_else(|| "expected an object mapping themes to word lists".to_string())?;
                if solution.groups.is_empty() {
                    return Err("no groups found".to_string());
                }
                Ok(solution)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{fast_policy, ScriptedGateway};
    use crate::puzzle::Word;

    #[tokio::test]
    async fn test_extracts_label_keyed_groups() {
        let gateway = ScriptedGateway::new(|request| {
            assert_eq!(request.role, ModelRole::Extractor);
            Ok(r#"{"KNACK": ["FLAIR", "TALENT", "INSTINCT", "FACULTY"]}"#.into())
        });
        let extractor = Extractor::new(gateway, fast_policy());
        let solution = extractor.extract("**KNACK**: [...]").await.unwrap();
        assert_eq!(solution.groups.len(), 1);
        assert_eq!(solution.groups[0].words[3], Word::new("FACULTY"));
    }

    #[tokio::test]
    async fn test_empty_object_is_retried() {
        let gateway = ScriptedGateway::new(|request| {
            if request.messages.len() <= 2 {
                Ok("{}".into())
            } else {
                Ok(r#"{"EMCEE": ["GIFT", "PRESENT", "HOST", "MODERATE"]}"#.into())
            }
        });
        let extractor = Extractor::new(gateway.clone(), fast_policy());
        let solution = extractor.extract("answer").await.unwrap();
        assert_eq!(solution.groups[0].label, "EMCEE");
        assert_eq!(gateway.calls_for(CallStage::Extraction).len(), 2);
    }
}
