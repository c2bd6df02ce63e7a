//! OpenAI-compatible `/chat/completions` adapter.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{CompletionGateway, CompletionRequest, GatewayError, ModelRole, ResponseFormat};
use crate::config::GatewayConfig;

/// Model names per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMap {
    pub solver: String,
    pub extractor: String,
    pub judge: String,
}

impl ModelMap {
    pub fn model_for(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Solver => &self.solver,
            ModelRole::Extractor => &self.extractor,
            ModelRole::Judge => &self.judge,
        }
    }
}

/// HTTP gateway for any server speaking the OpenAI chat completions API.
pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    models: ModelMap,
    temperature: Option<f32>,
}

impl OpenAiGateway {
    /// Build the HTTP client from the gateway settings.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: completions_url(&config.base_url),
            api_key: config.api_key.clone(),
            models: ModelMap {
                solver: config.solver_model.clone(),
                extractor: config.extractor_model.clone(),
                judge: config.judge_model.clone(),
            },
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.models.model_for(request.role),
            "messages": request.messages,
        });
        if request.format == ResponseFormat::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let start = std::time::Instant::now();
        let body = self.request_body(&request);

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp_json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let content = resp_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GatewayError::EmptyCompletion)?
            .to_string();

        debug!(
            stage = %request.stage,
            model = self.models.model_for(request.role),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "completion received"
        );
        Ok(content)
    }
}
