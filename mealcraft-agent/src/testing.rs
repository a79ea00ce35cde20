//! In-memory provider that replays scripted replies, for tests

use mealcraft_llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError, Usage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    RateLimited,
    Network(String),
    Empty,
}

/// Replays replies in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider answering every call with the given texts, in order
    pub fn with_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .ok_or_else(|| ProviderError::Other("script exhausted".to_string()))?;

        let content = match reply {
            ScriptedReply::Text(text) => Some(text),
            ScriptedReply::Empty => None,
            ScriptedReply::RateLimited => {
                return Err(ProviderError::RateLimited { retry_after: Some(1) })
            }
            ScriptedReply::Network(message) => return Err(ProviderError::Network(message)),
        };

        Ok(CompletionResponse {
            id: "scripted".to_string(),
            model,
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            },
        })
    }
}

/// A `(name, cost, calories, ingredients)` option row for [`meal_response`]
pub type OptionRow<'a> = (&'a str, f64, u32, &'a [&'a str]);

/// Render a contract-conforming response from option rows.
pub fn meal_response(options: &[OptionRow<'_>]) -> String {
    let options: Vec<serde_json::Value> = options
        .iter()
        .map(|(name, cost, calories, ingredients)| {
            serde_json::json!({
                "name": name,
                "description": format!("{} made simply", name),
                "calories": calories,
                "cost": cost,
                "prep_time": "15 mins",
                "ingredients": ingredients,
            })
        })
        .collect();
    serde_json::json!({
        "options": options,
        "budget_check": { "status": "approved", "message": "within budget" }
    })
    .to_string()
}

/// Three cheap plant-based options costing `each` apiece
pub fn cheap_response(each: f64) -> String {
    meal_response(&[
        ("Rice Bowl", each, 150, &["Rice", "black beans", "salsa"]),
        ("Lentil Soup", each, 140, &["lentils", "carrot", "onion"]),
        ("Fruit Plate", each, 100, &["banana", "apple", "Tomato"]),
    ])
}
