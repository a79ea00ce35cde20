//! Suggestion generator: one category specialist per meal category
//!
//! Each attempt builds the prompt from the current caps, asks the provider
//! for a JSON answer and validates it. Parse and dietary failures are
//! temporary and retried by the [`RetryPolicy`]; cap overruns and provider
//! failures end the category at once.

use crate::budget::{CategoryCaps, COST_EPSILON};
use crate::contract;
use crate::meal::{CategoryFailure, CategoryResult, MealCategory, MealSuggestion, UserConstraints};
use crate::prompt;
use crate::retry::{RetryOutcome, RetryPolicy};
use mealcraft_llm::{CompletionRequest, Error, LlmProvider, Result, UsageTracker};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Per-request completion parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionOptions {
    fn apply(&self, mut request: CompletionRequest) -> CompletionRequest {
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

pub struct SuggestionGenerator<'a, P> {
    provider: &'a P,
    category: MealCategory,
    policy: RetryPolicy,
    options: CompletionOptions,
    usage: Mutex<UsageTracker>,
}

impl<'a, P: LlmProvider> SuggestionGenerator<'a, P> {
    pub fn new(provider: &'a P, category: MealCategory) -> Self {
        Self {
            provider,
            category,
            policy: RetryPolicy::default(),
            options: CompletionOptions::default(),
            usage: Mutex::new(UsageTracker::new()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn category(&self) -> MealCategory {
        self.category
    }

    /// Token usage of every completion this generator made
    pub fn usage(&self) -> UsageTracker {
        self.usage.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Produce three validated options for the category, or a failure record.
    pub async fn generate(
        &self,
        constraints: &UserConstraints,
        remaining_budget: f64,
    ) -> CategoryResult {
        let caps = CategoryCaps::new(remaining_budget, constraints.calorie_goal);
        debug!(
            category = %self.category,
            budget = caps.budget,
            calories = caps.calories,
            per_meal = caps.per_meal,
            "generating suggestions"
        );

        let this = self;
        let caps_ref = &caps;
        let outcome = self
            .policy
            .run(move |attempt| this.attempt(constraints, caps_ref, attempt))
            .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                info!(
                    category = %self.category,
                    attempts,
                    total_cost = value.total_cost,
                    total_calories = value.total_calories,
                    "suggestions accepted"
                );
                CategoryResult::Planned(value)
            }
            RetryOutcome::Exhausted { error, attempts } => {
                warn!(category = %self.category, attempts, error = %error, "retries exhausted");
                CategoryResult::Failed(CategoryFailure::exhausted(attempts, &error))
            }
            RetryOutcome::Aborted { error, attempts } => {
                warn!(category = %self.category, attempts, error = %error, "generation aborted");
                CategoryResult::Failed(CategoryFailure::aborted(&error))
            }
        }
    }

    async fn attempt(
        &self,
        constraints: &UserConstraints,
        caps: &CategoryCaps,
        attempt: u32,
    ) -> Result<MealSuggestion> {
        let messages = prompt::build_messages(self.category, constraints, caps);
        let request = self
            .options
            .apply(CompletionRequest::new(messages))
            .with_json_mode(true);

        let (text, response) = self.provider.chat(request).await.map_err(|e| {
            Error::from(e)
                .with_operation("generator::complete")
                .with_context("category", self.category.as_str())
                .permanent()
        })?;
        if let Ok(mut usage) = self.usage.lock() {
            usage.track(&response.model, &response.usage);
        }
        debug!(category = %self.category, attempt, bytes = text.len(), "completion received");

        let parsed = contract::parse_response(&text).map_err(|e| {
            e.with_context("category", self.category.as_str())
                .with_context("attempt", attempt.to_string())
        })?;
        if let Some(check) = &parsed.budget_check {
            debug!(
                category = %self.category,
                status = %check.status,
                message = %check.message,
                "model budget check (informational)"
            );
        }

        for option in &parsed.options {
            if let Some(word) = constraints.dietary.forbidden_in(option) {
                return Err(Error::dietary_violation(
                    constraints.dietary.as_str(),
                    option.ingredients.join(" ").to_lowercase(),
                )
                .with_operation("generator::dietary")
                .with_context("option", option.name.clone())
                .with_context("forbidden", word)
                .temporary());
            }
        }

        let suggestion = MealSuggestion::new(parsed.options);
        if suggestion.total_cost > caps.budget + COST_EPSILON {
            return Err(Error::budget_exceeded(caps.budget, suggestion.total_cost)
                .with_operation("generator::caps")
                .permanent());
        }
        if suggestion.total_calories as f64 > caps.calories {
            return Err(Error::calorie_limit_exceeded(caps.calories, suggestion.total_calories)
                .with_operation("generator::caps")
                .permanent());
        }
        Ok(suggestion)
    }
}
