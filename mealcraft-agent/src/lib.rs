//! # mealcraft-agent
//!
//! Budget-constrained meal planning on top of a chat-completion provider:
//! 1. The allocator splits the remaining daily budget across four categories
//! 2. A generator per category prompts the model and validates its JSON answer
//! 3. Dietary and parse failures are retried; cap overruns are not
//! 4. Approved categories are charged to the allocator, denied ones may be reduced
//! 5. Ingredients of the accepted meals become a categorized shopping list
//!
//! The planner owns the provider; everything else is created per run.

pub mod budget;
pub mod contract;
pub mod dietary;
pub mod generator;
pub mod meal;
pub mod planner;
pub mod prompt;
pub mod reducer;
pub mod retry;
pub mod shopping;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use budget::{
    validate_budget, BudgetAllocator, BudgetCheck, BudgetDecision, BudgetStatus, CategoryCaps,
};
pub use contract::{parse_response, MealResponse};
pub use dietary::DietaryTag;
pub use generator::{CompletionOptions, SuggestionGenerator};
pub use meal::{
    CategoryFailure, CategoryResult, MealCategory, MealOption, MealSuggestion, UserConstraints,
};
pub use planner::{MealPlan, MealPlanner, PlannerSettings};
pub use reducer::{scale_portion, CostReducer};
pub use retry::{RetryOutcome, RetryPolicy};
pub use shopping::{ExportFormat, Ingredient, ShoppingList, StoreCategory};
