use chrono::NaiveDate;
use serde_json::Value;
use soultrip_core::{Difficulty, InferredFilters};
use soultrip_shared::InferenceConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::breaker::CircuitBreaker;
use crate::heuristic::simple_infer;
use crate::llm::{FilterModel, OpenAiClient};
use crate::{InferenceError, InferenceResult};

/// Turns a free-text trip description into listing filters.
///
/// Uses the model when one is configured and its circuit is closed; any
/// model failure degrades to the keyword heuristic instead of an error.
pub struct SearchInferrer {
    model: Option<Arc<dyn FilterModel>>,
    breaker: CircuitBreaker,
}

impl SearchInferrer {
    pub fn new(model: Option<Arc<dyn FilterModel>>, breaker: CircuitBreaker) -> Self {
        Self { model, breaker }
    }

    pub fn from_config(config: &InferenceConfig) -> InferenceResult<Self> {
        let model = OpenAiClient::from_config(config)?.map(|client| Arc::new(client) as Arc<dyn FilterModel>);
        let breaker = CircuitBreaker::new(
            "filter-model",
            config.failure_threshold,
            Duration::from_secs(config.reset_timeout_seconds),
        );
        Ok(Self::new(model, breaker))
    }

    /// Heuristic only
    pub fn heuristic() -> Self {
        Self::new(None, CircuitBreaker::new("filter-model", 1, Duration::from_secs(1)))
    }

    pub async fn infer(&self, query: &str) -> InferenceResult<InferredFilters> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InferenceError::InvalidQuery("Missing query".to_string()));
        }

        let Some(model) = &self.model else {
            return Ok(simple_infer(query));
        };
        if !self.breaker.check().await {
            debug!("{}", InferenceError::CircuitOpen(self.breaker.name.clone()));
            return Ok(simple_infer(query));
        }

        let content = match model.extract(query).await {
            Ok(content) => {
                self.breaker.record_success().await;
                content
            }
            Err(e) => {
                self.breaker.record_failure().await;
                warn!("Filter model {} failed, using heuristic: {}", model.name(), e);
                return Ok(simple_infer(query));
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => Ok(sanitize(&value)),
            Err(e) => {
                warn!("Filter model returned unparsable JSON, using heuristic: {}", e);
                Ok(simple_infer(query))
            }
        }
    }
}

/// Keep only well-formed fields from model output
pub fn sanitize(value: &Value) -> InferredFilters {
    let date = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
    };

    let countries = value.get("countries").and_then(Value::as_array).map(|list| {
        list.iter()
            .filter_map(Value::as_str)
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
    });

    let difficulty = value
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(|d| d.parse::<Difficulty>().ok());

    InferredFilters {
        start_date: date("startDate"),
        end_date: date("endDate"),
        countries: countries.filter(|list| !list.is_empty()),
        difficulty,
    }
}
