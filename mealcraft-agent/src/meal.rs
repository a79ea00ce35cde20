//! Meal domain types shared by the generator, planner and shopping list

use crate::budget::BudgetCheck;
use crate::dietary::DietaryTag;
use mealcraft_llm::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four meal categories a day is split into, in planning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Dinner,
        MealCategory::Snacks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => "breakfast",
            MealCategory::Lunch => "lunch",
            MealCategory::Dinner => "dinner",
            MealCategory::Snacks => "snacks",
        }
    }

    /// Singular noun used in prompts ("3 snack options")
    pub fn noun(&self) -> &'static str {
        match self {
            MealCategory::Snacks => "snack",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for MealCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One suggested meal as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealOption {
    pub name: String,
    pub description: String,
    pub calories: u32,
    pub cost: f64,
    pub prep_time: String,
    pub ingredients: Vec<String>,
}

/// Three validated options for a category plus their aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSuggestion {
    pub options: Vec<MealOption>,
    pub total_cost: f64,
    /// Summed in `u64` so three model-supplied `u32` values cannot wrap
    pub total_calories: u64,
    /// Set by the allocator once the category's cost is approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_check: Option<BudgetCheck>,
}

impl MealSuggestion {
    pub fn new(options: Vec<MealOption>) -> Self {
        let mut suggestion = Self {
            options,
            total_cost: 0.0,
            total_calories: 0,
            budget_check: None,
        };
        suggestion.recompute_totals();
        suggestion
    }

    pub fn recompute_totals(&mut self) {
        self.total_cost = self.options.iter().map(|o| o.cost).sum();
        self.total_calories = self.options.iter().map(|o| u64::from(o.calories)).sum();
    }
}

/// Error record kept for a category that produced no usable plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub kind: String,
}

pub const RELAXATION_SUGGESTION: &str = "Try relaxing constraints or increasing budget";

impl CategoryFailure {
    /// Every attempt failed with a retryable error
    pub fn exhausted(attempts: u32, last_error: &Error) -> Self {
        Self {
            error: format!("Failed after {} attempts: {}", attempts, last_error.message()),
            suggestion: Some(RELAXATION_SUGGESTION.to_string()),
            kind: ErrorKind::RetriesExhausted.as_str().to_string(),
        }
    }

    /// A non-retryable error ended generation
    pub fn aborted(error: &Error) -> Self {
        let message = match error.kind() {
            ErrorKind::BudgetExceeded | ErrorKind::CalorieLimitExceeded => {
                error.message().to_string()
            }
            _ => format!("Unexpected error: {}", error.message()),
        };
        Self {
            error: message,
            suggestion: None,
            kind: error.kind().as_str().to_string(),
        }
    }

    /// The allocator denied the category's total cost
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            suggestion: None,
            kind: ErrorKind::BudgetExceeded.as_str().to_string(),
        }
    }
}

/// Outcome for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryResult {
    Planned(MealSuggestion),
    Failed(CategoryFailure),
}

impl CategoryResult {
    pub fn is_planned(&self) -> bool {
        matches!(self, CategoryResult::Planned(_))
    }

    pub fn suggestion(&self) -> Option<&MealSuggestion> {
        match self {
            CategoryResult::Planned(suggestion) => Some(suggestion),
            CategoryResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CategoryFailure> {
        match self {
            CategoryResult::Planned(_) => None,
            CategoryResult::Failed(failure) => Some(failure),
        }
    }
}

/// What the user asked for. Defaults mirror the web form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConstraints {
    pub dietary: DietaryTag,
    /// Daily budget in dollars
    pub budget: f64,
    /// Daily calorie goal
    pub calorie_goal: u32,
    /// Preferred maximum preparation time, free text ("30 mins")
    pub prep_time: String,
}

impl Default for UserConstraints {
    fn default() -> Self {
        Self {
            dietary: DietaryTag::None,
            budget: 30.0,
            calorie_goal: 2000,
            prep_time: "30 mins".to_string(),
        }
    }
}

impl UserConstraints {
    pub fn validate(&self) -> Result<()> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(Error::invalid_argument(format!(
                "budget must be a non-negative amount, got {}",
                self.budget
            ))
            .with_context("budget", self.budget.to_string()));
        }
        if self.calorie_goal == 0 {
            return Err(Error::invalid_argument("calorie goal must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str, cost: f64, calories: u32) -> MealOption {
        MealOption {
            name: name.to_string(),
            description: String::new(),
            calories,
            cost,
            prep_time: "10 mins".to_string(),
            ingredients: vec![],
        }
    }

    #[test]
    fn test_suggestion_totals() {
        let suggestion = MealSuggestion::new(vec![
            option("Oatmeal", 1.5, 150),
            option("Toast", 1.0, 120),
            option("Smoothie", 2.5, 200),
        ]);
        assert_eq!(suggestion.total_cost, 5.0);
        assert_eq!(suggestion.total_calories, 470);
    }

    #[test]
    fn test_suggestion_calorie_total_is_wide() {
        let suggestion = MealSuggestion::new(vec![
            option("A", 1.0, u32::MAX),
            option("B", 1.0, u32::MAX),
            option("C", 1.0, 2),
        ]);
        assert_eq!(suggestion.total_calories, 2 * u64::from(u32::MAX) + 2);
    }

    #[test]
    fn test_category_result_serializes_with_status_tag() {
        let failed = CategoryResult::Failed(CategoryFailure::denied("Exceeds budget by $2.00"));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "Exceeds budget by $2.00");

        let back: CategoryResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, failed);
    }

    #[test]
    fn test_failure_messages() {
        let err = Error::parse_failed("Invalid meal options format");
        let failure = CategoryFailure::exhausted(3, &err);
        assert_eq!(failure.error, "Failed after 3 attempts: Invalid meal options format");
        assert_eq!(failure.suggestion.as_deref(), Some(RELAXATION_SUGGESTION));

        let failure = CategoryFailure::aborted(&Error::budget_exceeded(10.0, 12.0));
        assert_eq!(failure.error, "Budget exceeded $10.00");
        assert_eq!(failure.kind, "BudgetExceeded");

        let failure = CategoryFailure::aborted(&Error::unexpected("connection reset"));
        assert_eq!(failure.error, "Unexpected error: connection reset");
    }

    #[test]
    fn test_constraints_validation() {
        assert!(UserConstraints::default().validate().is_ok());

        let negative = UserConstraints {
            budget: -1.0,
            ..Default::default()
        };
        assert_eq!(negative.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);

        let no_calories = UserConstraints {
            calorie_goal: 0,
            ..Default::default()
        };
        assert!(no_calories.validate().is_err());
    }

    #[test]
    fn test_category_nouns() {
        assert_eq!(MealCategory::Snacks.noun(), "snack");
        assert_eq!(MealCategory::Dinner.noun(), "dinner");
        assert_eq!(MealCategory::ALL.len(), 4);
    }
}
