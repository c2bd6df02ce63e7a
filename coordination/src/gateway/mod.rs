//! Text completion boundary.
//!
//! ```text
//!   caller ──CompletionRequest──▶ complete_with_retry ──▶ CompletionGateway
//!                                   │ timeout per call          │
//!                                   │ bounded transport retry   ▼
//!                                   └──────────────────── String (raw text / JSON)
//! ```
//!
//! Every component talks to the model through [`CompletionGateway`], so
//! tests swap in a scripted implementation and the binary plugs in
//! [`OpenAiGateway`].

pub mod openai;
pub mod structured;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RetryConfig;

pub use openai::OpenAiGateway;
pub use structured::{ask_json, parse_json_object};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered message history owned by exactly one caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a system framing and an opening user message.
    pub fn seeded(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::system(content));
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent assistant reply.
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Number of user messages; corrections show up here.
    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }
}

/// Requested output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// Which configured model should serve the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Solver,
    Extractor,
    Judge,
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solver => write!(f, "solver"),
            Self::Extractor => write!(f, "extractor"),
            Self::Judge => write!(f, "judge"),
        }
    }
}

/// Pipeline step issuing a call. Used for logging and by scripted test
/// gateways to route responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStage {
    Debate,
    Extraction,
    Repair,
    RankProse,
    RankJson,
    Jury,
    PlanGeneration,
    Regeneration,
    Direct,
}

impl CallStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debate => "debate",
            Self::Extraction => "extraction",
            Self::Repair => "repair",
            Self::RankProse => "rank_prose",
            Self::RankJson => "rank_json",
            Self::Jury => "jury",
            Self::PlanGeneration => "plan_generation",
            Self::Regeneration => "regeneration",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub stage: CallStage,
    pub role: ModelRole,
    pub format: ResponseFormat,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn text(stage: CallStage, role: ModelRole, conversation: &Conversation) -> Self {
        Self {
            stage,
            role,
            format: ResponseFormat::Text,
            messages: conversation.messages().to_vec(),
        }
    }

    pub fn json(stage: CallStage, role: ModelRole, conversation: &Conversation) -> Self {
        Self {
            format: ResponseFormat::JsonObject,
            ..Self::text(stage, role, conversation)
        }
    }

    /// Content of the last user message, if any.
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("completion had no message content")]
    EmptyCompletion,

    #[error("no API key configured")]
    MissingCredentials,
}

impl GatewayError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::EmptyCompletion => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingCredentials => false,
        }
    }
}

/// One-shot completion service.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError>;
}

/// Gateway handle shared by concurrent tasks.
pub type SharedGateway = Arc<dyn CompletionGateway>;

/// Timeout and retry limits applied around every gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub transport_retries: u32,
    pub backoff: Duration,
    pub max_malformed_retries: u32,
}

impl CallPolicy {
    /// Policy from the retry settings.
    pub fn from_config(retry: &RetryConfig) -> Self {
        Self {
            timeout: Duration::from_secs(retry.call_timeout_secs),
            transport_retries: retry.transport_retries,
            backoff: Duration::from_millis(retry.backoff_ms),
            max_malformed_retries: retry.max_malformed_retries,
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Run one request under `policy`: each attempt is bounded by the timeout,
/// transient failures are retried with linear backoff.
pub async fn complete_with_retry(
    gateway: &dyn CompletionGateway,
    request: CompletionRequest,
    policy: &CallPolicy,
) -> Result<String, GatewayError> {
    let mut attempt = 0u32;
    loop {
        debug!(stage = %request.stage, role = %request.role, attempt, "gateway call");
        let result = match tokio::time::timeout(policy.timeout, gateway.complete(request.clone()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                secs: policy.timeout.as_secs(),
            }),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempt < policy.transport_retries => {
                attempt += 1;
                warn!(stage = %request.stage, attempt, error = %e, "transient gateway failure, retrying");
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Send the conversation as a text request and append the reply to it.
pub async fn ask_text(
    gateway: &dyn CompletionGateway,
    conversation: &mut Conversation,
    stage: CallStage,
    role: ModelRole,
    policy: &CallPolicy,
) -> Result<String, GatewayError> {
    let request = CompletionRequest::text(stage, role, conversation);
    let reply = complete_with_retry(gateway, request, policy).await?;
    conversation.push_assistant(reply.clone());
    Ok(reply)
}
