//! JSON-mode calls with bounded repair of malformed output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    complete_with_retry, CallPolicy, CallStage, CompletionGateway, CompletionRequest,
    Conversation, ModelRole,
};
use crate::error::{SolverError, SolverResult};

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("FENCED_JSON regex should compile")
});

/// Parse a completion as a JSON object. Markdown code fences are tolerated
/// because some servers ignore the JSON response format flag.
pub fn parse_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let body = FENCED_JSON
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Ask for a JSON object and run `extract` on it.
///
/// The reply is appended to `conversation`. When parsing or extraction
/// fails, `correction` (plus the problem found) is appended as a user
/// message and the call is repeated, at most `policy.max_malformed_retries`
/// extra times.
pub async fn ask_json<T, F>(
    gateway: &dyn CompletionGateway,
    conversation: &mut Conversation,
    stage: CallStage,
    role: ModelRole,
    policy: &CallPolicy,
    correction: &str,
    extract: F,
) -> SolverResult<T>
where
    F: Fn(&Value) -> Result<T, String>,
{
    let attempts = policy.max_malformed_retries + 1;
    for attempt in 1..=attempts {
        let request = CompletionRequest::json(stage, role, conversation);
        let reply = complete_with_retry(gateway, request, policy).await?;
        debug!(stage = %stage, attempt, reply = %reply, "structured reply");
        conversation.push_assistant(reply.clone());

        let problem = match parse_json_object(&reply) {
            Some(value) => match extract(&value) {
                Ok(extracted) => return Ok(extracted),
                Err(problem) => problem,
            },
            None => "the reply was not a JSON object".to_string(),
        };

        let err = SolverError::malformed(stage.as_str(), problem.clone());
        warn!(attempt, error = %err, "structured output rejected");
        if attempt < attempts {
            conversation.push_user(format!("{}\n\nProblem found: {}", correction, problem));
        }
    }

    Err(SolverError::RetriesExhausted {
        stage: stage.as_str(),
        attempts,
    })
}

/// Extractor requiring `key` to hold an array.
pub fn required_array<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>, String> {
    value
        .get(key)
        .ok_or_else(|| format!("missing '{}' key", key))?
        .as_array()
        .ok_or_else(|| format!("'{}' is not a list", key))
}
