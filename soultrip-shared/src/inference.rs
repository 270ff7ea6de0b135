use serde::Deserialize;

use crate::pii::Masked;

/// Settings for the LLM-backed search filter inference.
/// Without an `api_key` only the keyword heuristic runs.
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    pub api_key: Option<Masked<String>>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: usize,
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_seconds: u64,
}

fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_timeout() -> u64 { 10 }
fn default_failure_threshold() -> usize { 3 }
fn default_reset_timeout() -> u64 { 30 }

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            failure_threshold: default_failure_threshold(),
            reset_timeout_seconds: default_reset_timeout(),
        }
    }
}
