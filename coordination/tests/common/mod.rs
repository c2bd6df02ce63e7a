//! Shared helpers for the integration tests: a scripted gateway and the
//! sample puzzle.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use coordination::gateway::{CallStage, CompletionGateway, CompletionRequest, GatewayError};
use coordination::{Group, Plan, SolverConfig, WordUniverse};
use serde_json::{json, Map, Value};

type Responder = dyn Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync;

/// Gateway answering from a closure and recording every request.
pub struct ScriptedGateway {
    responder: Box<Responder>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls_for(&self, stage: CallStage) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.stage == stage)
            .cloned()
            .collect()
    }

    pub fn count(&self, stage: CallStage) -> usize {
        self.calls_for(stage).len()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let reply = (self.responder)(&request);
        self.calls.lock().unwrap().push(request);
        reply
    }
}

pub const BOARD: [&str; 16] = [
    "WAX", "CLAY", "PAPYRUS", "PARCHMENT", "GIFT", "PRESENT", "HOST", "MODERATE", "FLAIR",
    "TALENT", "INSTINCT", "FACULTY", "MUMMY", "ANCHOR", "BURRITO", "SPRAIN",
];

pub fn universe() -> WordUniverse {
    WordUniverse::new(BOARD).unwrap()
}

pub fn answers() -> Vec<Group> {
    vec![
        group("WRITING SURFACES", ["WAX", "CLAY", "PAPYRUS", "PARCHMENT"]),
        group("EMCEE", ["GIFT", "PRESENT", "HOST", "MODERATE"]),
        group("KNACK", ["FLAIR", "TALENT", "INSTINCT", "FACULTY"]),
        group("THINGS THAT ARE WRAPPED", ["MUMMY", "ANCHOR", "BURRITO", "SPRAIN"]),
    ]
}

pub fn group(label: &str, words: [&str; 4]) -> Group {
    Group::new(label, words).unwrap()
}

/// `{label: [words], ...}` as the extractor returns it.
pub fn extraction_json(groups: &[Group]) -> String {
    let mut map = Map::new();
    for g in groups {
        let words: Vec<Value> = g.words().iter().map(|w| json!(w.as_str())).collect();
        map.insert(g.label.clone(), Value::Array(words));
    }
    Value::Object(map).to_string()
}

/// `{"1": [words], ...}` in the given order.
pub fn rank_json(groups: &[&Group]) -> String {
    let mut map = Map::new();
    for (i, g) in groups.iter().enumerate() {
        let words: Vec<Value> = g.words().iter().map(|w| json!(w.as_str())).collect();
        map.insert((i + 1).to_string(), Value::Array(words));
    }
    Value::Object(map).to_string()
}

pub fn plan_json(groups: &[Group]) -> String {
    Plan {
        groups: groups.to_vec(),
    }
    .to_json()
    .to_string()
}

pub fn ballot(votes: &[bool]) -> String {
    json!({ "valid_bools": votes }).to_string()
}

/// Defaults with no backoff between retries.
pub fn test_config() -> SolverConfig {
    let mut config = SolverConfig::default();
    config.retry.backoff_ms = 0;
    config.retry.call_timeout_secs = 5;
    config
}
