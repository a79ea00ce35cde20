//! The planning run: four categories in order against one allocator
//!
//! Each category's caps are derived from whatever the previous categories
//! left over, so the run is strictly sequential. A failed category is
//! recorded and the run moves on.

use crate::budget::BudgetAllocator;
use crate::generator::{CompletionOptions, SuggestionGenerator};
use crate::meal::{CategoryFailure, CategoryResult, MealCategory, MealSuggestion, UserConstraints};
use crate::reducer::CostReducer;
use crate::retry::RetryPolicy;
use mealcraft_llm::{Error, LlmProvider, Result, UsageTracker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub retry: RetryPolicy,
    pub completion: CompletionOptions,
    /// Try the cost reducer when the allocator denies a category.
    ///
    /// The generator already rejects any category above its share of the
    /// remaining budget, so during [`MealPlanner::plan`] the allocator
    /// never denies and this only matters for results passed to `reconcile`
    /// directly.
    pub reduce_on_denial: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            completion: CompletionOptions::default(),
            reduce_on_denial: true,
        }
    }
}

/// A finished day plan; this is also the session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub constraints: UserConstraints,
    pub initial_budget: f64,
    pub remaining_budget: f64,
    /// One entry per category, in planning order
    pub meals: BTreeMap<MealCategory, CategoryResult>,
    #[serde(default)]
    pub usage: UsageTracker,
}

impl MealPlan {
    /// Accepted suggestions in planning order
    pub fn suggestions(&self) -> impl Iterator<Item = (MealCategory, &MealSuggestion)> {
        self.meals
            .iter()
            .filter_map(|(category, result)| result.suggestion().map(|s| (*category, s)))
    }

    /// Total cost of every approved category
    pub fn approved_cost(&self) -> f64 {
        self.suggestions().map(|(_, s)| s.total_cost).sum()
    }

    pub fn planned_count(&self) -> usize {
        self.suggestions().count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::serialization_failed(format!("failed to serialize meal plan: {}", e))
                .with_operation("plan::to_json")
                .set_source(e)
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::parse_failed(format!("invalid meal plan document: {}", e))
                .with_operation("plan::from_json")
                .set_source(e)
        })
    }
}

pub struct MealPlanner<P> {
    provider: P,
    settings: PlannerSettings,
    reducer: CostReducer,
}

impl<P: LlmProvider> MealPlanner<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            settings: PlannerSettings::default(),
            reducer: CostReducer::default(),
        }
    }

    pub fn with_settings(mut self, settings: PlannerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Plan breakfast, lunch, dinner and snacks for one day.
    pub async fn plan(&self, constraints: &UserConstraints) -> Result<MealPlan> {
        constraints.validate()?;
        info!(
            dietary = %constraints.dietary,
            budget = constraints.budget,
            calories = constraints.calorie_goal,
            provider = self.provider.name(),
            "planning meals"
        );

        let mut allocator = BudgetAllocator::new(constraints.budget);
        let mut usage = UsageTracker::new();
        let mut meals = BTreeMap::new();

        for category in MealCategory::ALL {
            let generator = SuggestionGenerator::new(&self.provider, category)
                .with_policy(self.settings.retry)
                .with_options(self.settings.completion.clone());
            let result = generator.generate(constraints, allocator.remaining()).await;
            usage.merge(&generator.usage());

            let result = self.reconcile(category, result, &mut allocator);
            meals.insert(category, result);
        }

        let plan = MealPlan {
            constraints: constraints.clone(),
            initial_budget: allocator.initial(),
            remaining_budget: allocator.remaining(),
            meals,
            usage,
        };
        info!(
            planned = plan.planned_count(),
            spent = allocator.spent(),
            remaining = plan.remaining_budget,
            tokens = plan.usage.total_tokens(),
            "meal plan complete"
        );
        Ok(plan)
    }

    /// Submit a generated category to the allocator.
    fn reconcile(
        &self,
        category: MealCategory,
        result: CategoryResult,
        allocator: &mut BudgetAllocator,
    ) -> CategoryResult {
        let mut suggestion = match result {
            CategoryResult::Planned(suggestion) => suggestion,
            failed => return failed,
        };

        let check = allocator.approve(suggestion.total_cost);
        if check.is_approved() {
            suggestion.budget_check = Some(check);
            return CategoryResult::Planned(suggestion);
        }

        warn!(%category, message = %check.message, "category denied by allocator");
        if self.settings.reduce_on_denial {
            if let Some(reduced) = self.reducer.fit_to_budget(&suggestion, allocator) {
                info!(%category, total_cost = reduced.total_cost, "category reduced to fit");
                return CategoryResult::Planned(reduced);
            }
        }
        CategoryResult::Failed(CategoryFailure::denied(check.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal::MealOption;
    use crate::testing::{cheap_response, ScriptedProvider};
    use mealcraft_llm::ErrorKind;

    fn constraints(budget: f64) -> UserConstraints {
        UserConstraints {
            budget,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_day_stays_within_budget() {
        let provider = ScriptedProvider::with_texts((0..4).map(|_| cheap_response(1.0)));
        let planner = MealPlanner::new(provider);

        let plan = planner.plan(&constraints(30.0)).await.unwrap();
        assert_eq!(plan.meals.len(), 4);
        assert_eq!(plan.planned_count(), 4);
        assert!(plan.approved_cost() <= plan.initial_budget);
        assert!((plan.remaining_budget - 18.0).abs() < 1e-9);
        assert_eq!(plan.usage.total_calls, 4);

        let order: Vec<_> = plan.meals.keys().copied().collect();
        assert_eq!(order, MealCategory::ALL.to_vec());

        let lunch = plan.meals[&MealCategory::Lunch].suggestion().unwrap();
        let check = lunch.budget_check.as_ref().unwrap();
        assert!(check.is_approved());
        assert_eq!(check.remaining_budget, 24.0);
    }

    #[tokio::test]
    async fn test_caps_follow_remaining_budget() {
        let provider = ScriptedProvider::with_texts((0..4).map(|_| cheap_response(2.0)));
        let planner = MealPlanner::new(provider);
        planner.plan(&constraints(40.0)).await.unwrap();

        let requests = planner.provider().requests();
        assert!(requests[0].messages[1].content.contains("combined cost ≤ $10.00"));
        // breakfast spent 6.00 of 40.00
        assert!(requests[1].messages[1].content.contains("combined cost ≤ $8.50"));
    }

    #[tokio::test]
    async fn test_failed_category_does_not_spend() {
        let provider = ScriptedProvider::with_texts([
            cheap_response(1.0),
            cheap_response(5.0),
            cheap_response(1.0),
            cheap_response(1.0),
        ]);
        let planner = MealPlanner::new(provider);

        let plan = planner.plan(&constraints(30.0)).await.unwrap();
        let lunch = plan.meals[&MealCategory::Lunch].failure().unwrap();
        assert!(lunch.error.starts_with("Budget exceeded"));
        assert_eq!(plan.planned_count(), 3);
        assert!((plan.initial_budget - plan.remaining_budget - plan.approved_cost()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_generator_cap_preempts_allocator_denial() {
        let script = || {
            ScriptedProvider::with_texts([
                cheap_response(1.0),
                cheap_response(5.0),
                cheap_response(1.0),
                cheap_response(1.0),
            ])
        };
        let reducing = MealPlanner::new(script()).plan(&constraints(30.0)).await.unwrap();
        let strict = MealPlanner::new(script())
            .with_settings(PlannerSettings {
                reduce_on_denial: false,
                ..Default::default()
            })
            .plan(&constraints(30.0))
            .await
            .unwrap();

        assert_eq!(reducing.meals, strict.meals);
        let lunch = strict.meals[&MealCategory::Lunch].failure().unwrap();
        assert_eq!(lunch.kind, ErrorKind::BudgetExceeded.as_str());
        assert!(lunch.error.starts_with("Budget exceeded"));
    }

    #[tokio::test]
    async fn test_invalid_constraints_rejected() {
        let planner = MealPlanner::new(ScriptedProvider::default());
        let err = planner.plan(&constraints(-5.0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(planner.provider().call_count(), 0);
    }

    fn pricey_suggestion() -> MealSuggestion {
        MealSuggestion::new(
            [4.0, 3.0, 2.0]
                .iter()
                .map(|cost| MealOption {
                    name: format!("${}", cost),
                    description: String::new(),
                    calories: 100,
                    cost: *cost,
                    prep_time: "5 mins".into(),
                    ingredients: vec![],
                })
                .collect(),
        )
    }

    #[test]
    fn test_denied_category_is_reduced() {
        let planner = MealPlanner::new(ScriptedProvider::default());
        let mut allocator = BudgetAllocator::new(5.0);

        let result = planner.reconcile(
            MealCategory::Dinner,
            CategoryResult::Planned(pricey_suggestion()),
            &mut allocator,
        );
        let reduced = result.suggestion().unwrap();
        assert_eq!(reduced.total_cost, 5.0);
        assert_eq!(reduced.options.len(), 2);
        assert_eq!(allocator.remaining(), 0.0);
    }

    #[test]
    fn test_denied_category_without_reduction() {
        let planner = MealPlanner::new(ScriptedProvider::default()).with_settings(PlannerSettings {
            reduce_on_denial: false,
            ..Default::default()
        });
        let mut allocator = BudgetAllocator::new(5.0);

        let result = planner.reconcile(
            MealCategory::Dinner,
            CategoryResult::Planned(pricey_suggestion()),
            &mut allocator,
        );
        assert_eq!(result.failure().unwrap().error, "Exceeds budget by $4.00");
        assert_eq!(allocator.remaining(), 5.0);
    }

    #[tokio::test]
    async fn test_plan_json_round_trip() {
        let provider = ScriptedProvider::with_texts((0..4).map(|_| cheap_response(1.0)));
        let plan = MealPlanner::new(provider).plan(&constraints(30.0)).await.unwrap();

        let json = plan.to_json().unwrap();
        assert!(json.contains("\"breakfast\""));
        assert_eq!(MealPlan::from_json(&json).unwrap(), plan);
        assert!(MealPlan::from_json("not json").is_err());
    }
}
