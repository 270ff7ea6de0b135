use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use soultrip_shared::InferenceConfig;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::{InferenceError, InferenceResult};

const SYSTEM_PROMPT: &str = "You are an assistant that extracts search filters from a brief trip description.
Return a STRICT JSON object with keys: startDate, endDate, countries, difficulty.
Rules:
- Dates must be in YYYY-MM-DD when you can infer a concrete date; otherwise null.
- Difficulty must be one of: easy | moderate | challenging | intense | null.
- Countries should be an array of country names in Title Case mentioned in the description directly or indirectly (e.g. if a continent is mentioned, include the top 10 countries in that continent).
- If you cannot infer a field, set it to null. Do not guess beyond common sense.";

/// A model that turns a trip description into a JSON filter object
#[async_trait]
pub trait FilterModel: Send + Sync {
    /// Raw JSON text produced by the model
    async fn extract(&self, query: &str) -> InferenceResult<String>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// `None` when no API key is configured
    pub fn from_config(config: &InferenceConfig) -> InferenceResult<Option<Self>> {
        let Some(api_key) = config.api_key.as_ref() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Some(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.expose().clone(),
            model: config.model.clone(),
        }))
    }
}

#[async_trait]
impl FilterModel for OpenAiClient {
    async fn extract(&self, query: &str) -> InferenceResult<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Description: {}", query),
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        debug!("Filter model call took {} ms", started.elapsed().as_millis());

        if !response.status().is_success() {
            return Err(InferenceError::Service(format!(
                "model endpoint returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Service(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(InferenceError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
