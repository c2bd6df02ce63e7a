//! Confidence ranking of one agent's groups.
//!
//! Two turns in the agent's own conversation: a prose ranking, then the
//! same ranking as `{"<rank>": [words]}`. If the structured ranking never
//! covers exactly the agent's groups, the agent's own order is used and the
//! result is marked degraded.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use crate::error::{SolverError, SolverResult};
use crate::gateway::{ask_json, ask_text, CallPolicy, CallStage, Conversation, ModelRole, SharedGateway};
use crate::prompts;
use crate::puzzle::{AgentSolution, Group, Plan, RankedSolution, Word};

/// Asks an agent to order its own groups by confidence.
#[derive(Clone)]
pub struct Ranker {
    gateway: SharedGateway,
    policy: CallPolicy,
}

impl Ranker {
    pub fn new(gateway: SharedGateway, policy: CallPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Rank `plan` inside the agent's conversation. Never fails on bad JSON;
    /// see [`RankedSolution::degraded`].
    pub async fn rank(
        &self,
        conversation: &mut Conversation,
        plan: &Plan,
    ) -> SolverResult<RankedSolution> {
        conversation.push_user(prompts::RANK_PROSE_REQUEST);
        ask_text(
            self.gateway.as_ref(),
            conversation,
            CallStage::RankProse,
            ModelRole::Solver,
            &self.policy,
        )
        .await?;

        conversation.push_user(prompts::rank_json_request(&AgentSolution::new(
            plan.candidates(),
        )));
        let ranked = ask_json(
            self.gateway.as_ref(),
            conversation,
            CallStage::RankJson,
            ModelRole::Solver,
            &self.policy,
            prompts::RANK_CORRECTION,
            |value| parse_ranking(value, plan),
        )
        .await;

        match ranked {
            Ok(ranked) => Ok(ranked),
            Err(SolverError::RetriesExhausted { attempts, .. }) => {
                warn!(attempts, "ranking unusable, falling back to answer order");
                Ok(RankedSolution {
                    degraded: true,
                    ..RankedSolution::in_order(plan.groups.clone())
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Map a `{"<rank>": [words]}` object onto the groups of `plan`. Ranks are
/// renumbered 1..=n in ascending key order.
pub fn parse_ranking(value: &Value, plan: &Plan) -> Result<RankedSolution, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "ranking is not an object".to_string())?;

    let mut entries: Vec<(u32, Group)> = Vec::with_capacity(object.len());
    for (key, words) in object {
        let rank: u32 = key
            .trim()
            .parse()
            .map_err(|_| format!("rank key '{}' is not an integer", key))?;
        let words = words
            .as_array()
            .ok_or_else(|| format!("rank {} is not a word list", rank))?
            .iter()
            .map(|w| w.as_str().map(Word::new))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| format!("rank {} contains a non-string word", rank))?;
        let listed = Group::new(String::new(), words)
            .ok_or_else(|| format!("rank {} does not list four distinct words", rank))?;
        let matched = plan
            .groups
            .iter()
            .find(|g| g.key() == listed.key())
            .ok_or_else(|| format!("rank {} lists a group that is not in your answer", rank))?;
        entries.push((rank, matched.clone()));
    }

    if entries.len() != plan.len() {
        return Err(format!(
            "ranking covers {} groups, expected {}",
            entries.len(),
            plan.len()
        ));
    }
    let distinct: BTreeSet<_> = entries.iter().map(|(_, g)| g.key()).collect();
    if distinct.len() != entries.len() {
        return Err("a group is ranked more than once".to_string());
    }

    entries.sort_by_key(|(rank, _)| *rank);
    Ok(RankedSolution::in_order(
        entries.into_iter().map(|(_, g)| g).collect(),
    ))
}
