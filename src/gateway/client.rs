//! Vision service client.
//!
//! One classification is exactly one HTTPS request to the Anthropic
//! Messages API: a base64 image block plus the step's prompt. No retry is
//! performed here; a failed call is reported to the session and the user
//! re-triggers the phase with a fresh capture.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::app::config::GatewayConfig;
use crate::camera::Frame;
use crate::gateway::prompts::PromptSet;
use crate::gateway::schema::{extract_json_object, ClassificationResult, ValidationStep};

/// The classification seam between the session and the vision service.
///
/// Stateless across calls; implementations must not retry internally.
#[async_trait]
pub trait ClassifierGateway: Send + Sync {
    /// Classify a still frame for the given validation step.
    async fn classify(
        &self,
        frame: &Frame,
        step: ValidationStep,
    ) -> crate::Result<ClassificationResult>;
}

/// Anthropic API response body
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

/// Production gateway backed by the Anthropic Messages API.
pub struct AnthropicVision {
    /// API endpoint
    endpoint: String,
    /// Model to use
    model: String,
    /// Max tokens for the response
    max_tokens: u32,
    /// API key (read from environment)
    api_key: String,
    /// HTTP client with the configured request timeout
    client: Client,
    /// Prompt templates, one per step
    prompts: PromptSet,
}

impl AnthropicVision {
    /// Environment variable holding the API key.
    pub const API_KEY_ENV: &'static str = "ANTHROPIC_API_KEY";

    /// Build a gateway from config, reading the API key from the
    /// environment. A missing key is a configuration error here rather
    /// than a per-call failure.
    pub fn from_config(config: &GatewayConfig) -> crate::Result<Self> {
        let api_key = std::env::var(Self::API_KEY_ENV).map_err(|_| {
            crate::Error::Config(format!("{} is not set", Self::API_KEY_ENV))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Build a gateway with an explicit API key.
    pub fn with_api_key(config: &GatewayConfig, api_key: String) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            client,
            prompts: PromptSet::builtin(),
        })
    }

    /// Build the Messages API request body for one classification.
    fn build_request(&self, frame: &Frame, step: ValidationStep) -> serde_json::Value {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(&frame.bytes);

        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": frame.media_type,
                            "data": image_b64
                        }
                    },
                    {
                        "type": "text",
                        "text": self.prompts.for_step(step)
                    }
                ]
            }]
        })
    }
}

#[async_trait]
impl ClassifierGateway for AnthropicVision {
    async fn classify(
        &self,
        frame: &Frame,
        step: ValidationStep,
    ) -> crate::Result<ClassificationResult> {
        frame.ensure_valid()?;

        debug!(
            step = %step,
            media_type = %frame.media_type,
            bytes = frame.bytes.len(),
            prompt_version = self.prompts.version,
            "Sending classification request"
        );

        let body = self.build_request(frame, step);
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(step = %step, error = %e, "Classification request failed");
                crate::Error::Service(format!("classification request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(step = %step, status = %status, "Classification service returned error status");
            return Err(crate::Error::Service(format!(
                "classification service returned {status}"
            )));
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            crate::Error::Service(format!("unreadable service response: {e}"))
        })?;

        let text = api_response
            .content
            .first()
            .map(|b| b.text.as_str())
            .ok_or_else(|| crate::Error::Service("empty service response".to_string()))?;

        let json = extract_json_object(text).ok_or_else(|| {
            crate::Error::Service("service response contains no JSON object".to_string())
        })?;

        let result = ClassificationResult::from_json(json)?.normalized(step);
        debug!(step = %step, ?result, "Classification result parsed");
        Ok(result)
    }
}
