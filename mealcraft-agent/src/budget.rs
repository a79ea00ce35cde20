//! Budget allocation across the day's meal categories
//!
//! `validate_budget` is a pure check; `BudgetAllocator` owns the running
//! balance for one planning run and only ever moves it downward.

use crate::meal::MealCategory;
use serde::{Deserialize, Serialize};

/// Number of categories the daily budget and calorie goal are split across
pub const MEAL_CATEGORY_COUNT: usize = MealCategory::ALL.len();

/// Options suggested per category
pub const OPTIONS_PER_CATEGORY: usize = 3;

/// Tolerance for summed float costs (e.g. 3.33 + 3.33 + 3.34)
pub(crate) const COST_EPSILON: f64 = 1e-9;

/// Result of checking one cost against a remaining balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDecision {
    pub approved: bool,
    pub remaining_budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficit: Option<f64>,
    pub message: String,
}

/// Check whether `cost` fits in `remaining`.
///
/// On approval the returned balance is `remaining - cost`; on denial it is
/// `remaining` unchanged and the shortfall is reported as `deficit`.
pub fn validate_budget(cost: f64, remaining: f64) -> BudgetDecision {
    if cost <= remaining + COST_EPSILON {
        let left = (remaining - cost).max(0.0);
        BudgetDecision {
            approved: true,
            remaining_budget: left,
            deficit: None,
            message: format!("Budget approved. ${:.2} remaining", left),
        }
    } else {
        let deficit = cost - remaining;
        BudgetDecision {
            approved: false,
            remaining_budget: remaining,
            deficit: Some(deficit),
            message: format!("Exceeds budget by ${:.2}", deficit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Approved,
    Denied,
}

/// The allocator's verdict on a category, stored alongside the suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheck {
    pub status: BudgetStatus,
    pub message: String,
    pub remaining_budget: f64,
}

impl BudgetCheck {
    pub fn is_approved(&self) -> bool {
        self.status == BudgetStatus::Approved
    }
}

/// Running balance for a single planning run.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    initial: f64,
    remaining: f64,
}

impl BudgetAllocator {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            remaining: initial,
        }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn spent(&self) -> f64 {
        self.initial - self.remaining
    }

    /// Charge `cost` if it fits; the balance is untouched on denial.
    pub fn approve(&mut self, cost: f64) -> BudgetCheck {
        let decision = validate_budget(cost, self.remaining);
        if decision.approved {
            self.remaining = decision.remaining_budget;
        }
        BudgetCheck {
            status: if decision.approved {
                BudgetStatus::Approved
            } else {
                BudgetStatus::Denied
            },
            message: decision.message,
            remaining_budget: self.remaining,
        }
    }

    /// Caps for the next category, derived from the current balance
    pub fn caps(&self, calorie_goal: u32) -> CategoryCaps {
        CategoryCaps::new(self.remaining, calorie_goal)
    }
}

/// Per-category limits embedded in prompts and enforced on responses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryCaps {
    /// Combined cost allowed for all options of the category
    pub budget: f64,
    /// Combined calories allowed for all options of the category
    pub calories: f64,
    /// Cost ceiling for any single option
    pub per_meal: f64,
}

impl CategoryCaps {
    pub fn new(remaining_budget: f64, calorie_goal: u32) -> Self {
        let budget = remaining_budget / MEAL_CATEGORY_COUNT as f64;
        Self {
            budget,
            calories: calorie_goal as f64 / MEAL_CATEGORY_COUNT as f64,
            per_meal: budget / OPTIONS_PER_CATEGORY as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_keeps_balance_and_reports_deficit() {
        let decision = validate_budget(15.0, 10.0);
        assert!(!decision.approved);
        assert_eq!(decision.remaining_budget, 10.0);
        assert_eq!(decision.deficit, Some(5.0));
        assert_eq!(decision.message, "Exceeds budget by $5.00");
    }

    #[test]
    fn test_approved_reduces_balance() {
        let decision = validate_budget(8.0, 10.0);
        assert!(decision.approved);
        assert_eq!(decision.remaining_budget, 2.0);
        assert_eq!(decision.deficit, None);
        assert_eq!(decision.message, "Budget approved. $2.00 remaining");
    }

    #[test]
    fn test_exact_fit_is_approved() {
        let total = 3.33 + 3.33 + 3.34;
        assert!(validate_budget(total, 10.0).approved);
    }

    #[test]
    fn test_allocator_only_moves_down_on_approval() {
        let mut allocator = BudgetAllocator::new(30.0);

        let check = allocator.approve(7.5);
        assert!(check.is_approved());
        assert_eq!(allocator.remaining(), 22.5);

        let check = allocator.approve(40.0);
        assert_eq!(check.status, BudgetStatus::Denied);
        assert_eq!(check.remaining_budget, 22.5);
        assert_eq!(allocator.remaining(), 22.5);

        assert_eq!(allocator.spent(), 7.5);
        assert_eq!(allocator.initial(), 30.0);
    }

    #[test]
    fn test_category_caps() {
        let caps = CategoryCaps::new(40.0, 2000);
        assert_eq!(caps.budget, 10.0);
        assert_eq!(caps.calories, 500.0);
        assert!((caps.per_meal - 10.0 / 3.0).abs() < 1e-12);

        let allocator = BudgetAllocator::new(40.0);
        assert_eq!(allocator.caps(2000), caps);
    }
}
