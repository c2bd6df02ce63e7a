//! Debate driver: N agents, R rounds, then extraction.
//!
//! Agents of one round run concurrently in a `JoinSet`, each task owning its
//! agent's context; the round is joined before peer messages for the next
//! round are built.

use futures::future::join_all;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::extraction::Extractor;
use super::state::{AgentContext, DebatePhase};
use crate::error::{SolverError, SolverResult};
use crate::gateway::{CallPolicy, CallStage, GatewayError, SharedGateway};
use crate::prompts;
use crate::puzzle::{AgentSolution, NegativeExampleSet, WordUniverse};

/// Final state of a debate: contexts and extracted solutions, both in
/// agent-index order.
#[derive(Debug, Clone)]
pub struct DebateOutcome {
    pub agents: Vec<AgentContext>,
    pub solutions: Vec<AgentSolution>,
}

/// Multi-agent debate over one board.
pub struct Debate {
    gateway: SharedGateway,
    extractor: Extractor,
    agents: usize,
    rounds: usize,
    policy: CallPolicy,
}

impl Debate {
    /// Create a debate of `agents` solvers over `rounds` turns each.
    pub fn new(
        gateway: SharedGateway,
        agents: usize,
        rounds: usize,
        policy: CallPolicy,
    ) -> SolverResult<Self> {
        if agents == 0 || rounds == 0 {
            return Err(SolverError::Configuration(format!(
                "debate needs at least one agent and one round (got {} agents, {} rounds)",
                agents, rounds
            )));
        }
        Ok(Self {
            extractor: Extractor::new(gateway.clone(), policy),
            gateway,
            agents,
            rounds,
            policy,
        })
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Full debate over `universe`, with known-bad groups in the question.
    pub async fn run(
        &self,
        universe: &WordUniverse,
        memory: &NegativeExampleSet,
    ) -> SolverResult<DebateOutcome> {
        let agents = self.deliberate(universe, memory).await?;

        info!(phase = %DebatePhase::Extraction, agents = agents.len(), "extracting solutions");
        let extracted = join_all(
            agents
                .iter()
                .map(|agent| self.extractor.extract(agent.latest_answer().unwrap_or_default())),
        )
        .await;

        // An unreadable answer leaves the agent with an empty solution; the
        // repair loop corrects or drops it.
        let mut solutions = Vec::with_capacity(extracted.len());
        for (agent, result) in agents.iter().zip(extracted) {
            match result {
                Ok(solution) => solutions.push(solution),
                Err(SolverError::RetriesExhausted { attempts, .. }) => {
                    warn!(agent = agent.index, attempts, "extraction failed, agent left unsolved");
                    solutions.push(AgentSolution::default());
                }
                Err(e) => return Err(e),
            }
        }

        info!(phase = %DebatePhase::Complete, "debate finished");
        Ok(DebateOutcome { agents, solutions })
    }

    /// Run all rounds and return the agent contexts.
    pub async fn deliberate(
        &self,
        universe: &WordUniverse,
        memory: &NegativeExampleSet,
    ) -> SolverResult<Vec<AgentContext>> {
        let question = prompts::debate_question(universe, memory);
        let mut agents: Vec<AgentContext> = (0..self.agents)
            .map(|index| AgentContext::new(index, prompts::SOLVER_FRAME, &question))
            .collect();

        for round in 0..self.rounds {
            let phase = DebatePhase::for_round(round);
            if round > 0 {
                append_peer_messages(&mut agents);
            }
            agents = self.run_round(agents).await?;
            if agents.is_empty() {
                return Err(SolverError::RetriesExhausted {
                    stage: CallStage::Debate.as_str(),
                    attempts: round as u32 + 1,
                });
            }
            info!(%phase, agents = agents.len(), "debate round complete");
        }

        Ok(agents)
    }

    async fn run_round(&self, agents: Vec<AgentContext>) -> SolverResult<Vec<AgentContext>> {
        let mut join_set: JoinSet<(AgentContext, Result<(), GatewayError>)> = JoinSet::new();
        for mut agent in agents {
            let gateway = self.gateway.clone();
            let policy = self.policy;
            join_set.spawn(async move {
                let result = agent
                    .take_turn(gateway.as_ref(), CallStage::Debate, &policy)
                    .await
                    .map(|_| ());
                (agent, result)
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((agent, Ok(()))) => {
                    debug!(agent = agent.index, answer = ?agent.latest_answer(), "agent answered");
                    finished.push(agent);
                }
                Ok((agent, Err(e))) => {
                    warn!(agent = agent.index, error = %e, "debate agent failed");
                    return Err(e.into());
                }
                Err(e) => {
                    // Panicked task; its context is lost, carry on without it.
                    warn!(error = %e, "debate agent task panicked");
                }
            }
        }
        finished.sort_by_key(|agent| agent.index);
        Ok(finished)
    }
}

/// Give every agent the other agents' latest answers, or a self-check
/// prompt when it debates alone.
fn append_peer_messages(agents: &mut [AgentContext]) {
    let latest: Vec<(usize, String)> = agents
        .iter()
        .map(|a| (a.index, a.latest_answer().unwrap_or_default().to_string()))
        .collect();

    for agent in agents.iter_mut() {
        let peers: Vec<String> = latest
            .iter()
            .filter(|(index, _)| *index != agent.index)
            .map(|(_, answer)| answer.clone())
            .collect();
        let message = if peers.is_empty() {
            prompts::self_check_message()
        } else {
            prompts::peer_message(&peers)
        };
        agent.conversation.push_user(message);
    }
}
