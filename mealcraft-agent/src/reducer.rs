//! Cost reduction for categories the allocator denied
//!
//! Options are dropped most-expensive first. Once a single option is left its
//! portion is scaled: first in one step when the cut is small, then in 10%
//! steps up to a fixed cap.

use crate::budget::{BudgetAllocator, COST_EPSILON};
use crate::meal::{MealOption, MealSuggestion};
use tracing::debug;

/// Factor applied per reduction step on the last option
pub const SCALE_STEP: f64 = 0.9;
/// Upper bound on 10% reduction steps
pub const MAX_SCALE_STEPS: usize = 64;
/// Smallest portion `scale_portion` will compute
pub const MIN_PORTION: f64 = 0.5;
/// Smallest portion `scale_portion` will accept
pub const ACCEPTED_PORTION: f64 = 0.7;

#[derive(Debug, Clone, Copy)]
pub struct CostReducer {
    max_scale_steps: usize,
}

impl Default for CostReducer {
    fn default() -> Self {
        Self {
            max_scale_steps: MAX_SCALE_STEPS,
        }
    }
}

fn total_cost(options: &[MealOption]) -> f64 {
    options.iter().map(|o| o.cost).sum()
}

impl CostReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_scale_steps(mut self, steps: usize) -> Self {
        self.max_scale_steps = steps;
        self
    }

    /// Shrink `suggestion` until it fits the allocator's remaining budget and
    /// submit the reduced total. Returns the approved reduction, or `None`
    /// if nothing affordable is left.
    pub fn fit_to_budget(
        &self,
        suggestion: &MealSuggestion,
        allocator: &mut BudgetAllocator,
    ) -> Option<MealSuggestion> {
        let remaining = allocator.remaining();
        if remaining <= 0.0 {
            return None;
        }

        let mut options = suggestion.options.clone();
        options.sort_by(|a, b| b.cost.total_cmp(&a.cost));

        while options.len() > 1 && total_cost(&options) > remaining + COST_EPSILON {
            let dropped = options.remove(0);
            debug!(option = %dropped.name, cost = dropped.cost, "dropped option");
        }

        if let Some(last) = options.first_mut() {
            if last.cost > remaining + COST_EPSILON && scale_portion(last, remaining).is_none() {
                let mut steps = 0;
                while last.cost > remaining + COST_EPSILON && steps < self.max_scale_steps {
                    last.cost *= SCALE_STEP;
                    steps += 1;
                }
                debug!(option = %last.name, steps, cost = last.cost, "scaled option");
            }
        }

        let mut reduced = MealSuggestion::new(options);
        let check = allocator.approve(reduced.total_cost);
        if !check.is_approved() {
            return None;
        }
        reduced.budget_check = Some(check);
        Some(reduced)
    }
}

/// Scale one option's portion down to `available`.
///
/// The factor `available / cost` is clamped to `[0.5, 1.0]` and only applied
/// when it is at least 0.7. On success the option's cost is updated, its
/// description is annotated and the new cost is returned.
pub fn scale_portion(option: &mut MealOption, available: f64) -> Option<f64> {
    if option.cost <= 0.0 || !option.cost.is_finite() {
        return None;
    }

    let factor = (available / option.cost).clamp(MIN_PORTION, 1.0);
    if factor < ACCEPTED_PORTION {
        return None;
    }

    let scaled = option.cost * factor;
    let reduced_by = ((1.0 - factor) * 100.0).round();
    if reduced_by > 0.0 {
        option
            .description
            .push_str(&format!(" (portion reduced by {}%)", reduced_by));
    }
    option.cost = scaled;
    Some(scaled)
}
