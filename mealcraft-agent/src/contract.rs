//! The JSON response contract for meal suggestions
//!
//! The model must answer with a single JSON object, optionally inside a
//! markdown code fence. Anything else is a `ParseFailed` error marked
//! temporary so the generator asks again.

use crate::budget::OPTIONS_PER_CATEGORY;
use crate::meal::MealOption;
use mealcraft_llm::{Error, Result};
use serde::{Deserialize, Serialize};

/// The payload a category specialist is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealResponse {
    pub options: Vec<MealOption>,
    /// The model's own view of affordability; informational only
    #[serde(default)]
    pub budget_check: Option<ModelBudgetCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBudgetCheck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// The shape embedded in every prompt
pub const RESPONSE_FORMAT: &str = r#"{
  "options": [
    {
      "name": "string (e.g., 'Avocado Toast')",
      "description": "string (brief meal description)",
      "calories": "integer (e.g., 300-500)",
      "cost": "float (e.g., 2.50)",
      "prep_time": "string (e.g., '15 mins')",
      "ingredients": ["string (e.g., 'item1')", "string (e.g., 'item2')"]
    }
  ],
  "budget_check": {
    "status": "string ('approved' or 'denied')",
    "message": "string (budget feedback)"
  }
}"#;

/// Strip a surrounding ```/```json fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn contract_error(message: impl Into<String>) -> Error {
    Error::parse_failed(message)
        .with_operation("contract::parse")
        .temporary()
}

/// Parse and structurally validate a completion.
pub fn parse_response(text: &str) -> Result<MealResponse> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(contract_error("No valid JSON found"));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        contract_error(format!("No valid JSON found: {}", e))
            .with_context("length", body.len().to_string())
            .set_source(e)
    })?;
    if !value.is_object() {
        return Err(contract_error("Expected a JSON object with an `options` field"));
    }

    let response: MealResponse = serde_json::from_value(value).map_err(|e| {
        contract_error(format!("Invalid meal options format: {}", e)).set_source(e)
    })?;

    validate_options(&response.options)?;
    Ok(response)
}

fn validate_options(options: &[MealOption]) -> Result<()> {
    if options.len() != OPTIONS_PER_CATEGORY {
        return Err(contract_error(format!(
            "Invalid meal options format: expected {} options, got {}",
            OPTIONS_PER_CATEGORY,
            options.len()
        )));
    }

    for option in options {
        if !option.cost.is_finite() || option.cost < 0.0 {
            return Err(contract_error(format!(
                "Invalid cost for '{}': {}",
                option.name, option.cost
            )));
        }
    }
    Ok(())
}
