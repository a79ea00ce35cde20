//! `mealcraft plan` and `mealcraft shopping-list`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use mealcraft_agent::{
    CategoryResult, DietaryTag, ExportFormat, MealPlan, MealPlanner, ShoppingList,
    UserConstraints,
};
use mealcraft_llm::{Error, LlmProvider};

#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub dietary: String,
    pub budget: f64,
    pub calories: u32,
    pub time: String,
    pub save: Option<PathBuf>,
    pub format: String,
}

impl PlanArgs {
    pub fn constraints(&self) -> UserConstraints {
        UserConstraints {
            dietary: DietaryTag::parse(&self.dietary),
            budget: self.budget,
            calorie_goal: self.calories,
            prep_time: self.time.clone(),
        }
    }
}

/// Run a planning pass and render the summary plus shopping list.
pub async fn run_plan<P: LlmProvider>(planner: &MealPlanner<P>, args: &PlanArgs) -> Result<String> {
    // Reject a bad format before spending any completions
    let format: ExportFormat = args.format.parse()?;

    let plan = planner.plan(&args.constraints()).await?;
    if let Some(path) = &args.save {
        std::fs::write(path, plan.to_json()?)
            .map_err(|e| file_error(e, "plan::save", path))
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
        info!(path = %path.display(), "saved meal plan");
    }

    let list = ShoppingList::from_plan(&plan);
    let mut output = render_summary(&plan);
    output.push('\n');
    output.push_str(&list.render(format)?);
    Ok(output)
}

fn file_error(err: std::io::Error, operation: &'static str, path: &Path) -> Error {
    Error::from(err)
        .with_operation(operation)
        .with_context("path", path.display().to_string())
}

/// Rebuild the shopping list from a saved plan file.
pub fn run_shopping_list(plan_file: &Path, format: &str) -> Result<String> {
    let json = std::fs::read_to_string(plan_file)
        .map_err(|e| file_error(e, "plan::load", plan_file))
        .with_context(|| format!("failed to read plan file {}", plan_file.display()))?;
    let plan = MealPlan::from_json(&json)?;
    Ok(ShoppingList::from_plan(&plan).export(format)?)
}

pub fn render_summary(plan: &MealPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Meal Plan ({})", plan.constraints.dietary);
    let _ = writeln!(out, "{}", "=".repeat(50));

    for (category, result) in &plan.meals {
        match result {
            CategoryResult::Planned(suggestion) => {
                let _ = writeln!(
                    out,
                    "\n{} (${:.2}, {} kcal)",
                    category.as_str().to_uppercase(),
                    suggestion.total_cost,
                    suggestion.total_calories
                );
                for option in &suggestion.options {
                    let _ = writeln!(
                        out,
                        "- {}: ${:.2}, {} kcal, {}",
                        option.name, option.cost, option.calories, option.prep_time
                    );
                    if !option.description.is_empty() {
                        let _ = writeln!(out, "    {}", option.description);
                    }
                }
            }
            CategoryResult::Failed(failure) => {
                let _ = writeln!(out, "\n{} (not planned)", category.as_str().to_uppercase());
                let _ = writeln!(out, "! {}", failure.error);
                if let Some(suggestion) = &failure.suggestion {
                    let _ = writeln!(out, "  {}", suggestion);
                }
            }
        }
    }

    let _ = writeln!(out, "\n{}", "=".repeat(50));
    let _ = writeln!(
        out,
        "Remaining budget: ${:.2} of ${:.2}",
        plan.remaining_budget, plan.initial_budget
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealcraft_agent::testing::{cheap_response, ScriptedProvider};
    use mealcraft_llm::ErrorKind;

    fn args(format: &str, save: Option<PathBuf>) -> PlanArgs {
        PlanArgs {
            dietary: "vegan".into(),
            budget: 30.0,
            calories: 2000,
            time: "30 mins".into(),
            save,
            format: format.into(),
        }
    }

    fn planner() -> MealPlanner<ScriptedProvider> {
        MealPlanner::new(ScriptedProvider::with_texts(
            (0..4).map(|_| cheap_response(1.0)),
        ))
    }

    #[tokio::test]
    async fn plan_renders_summary_and_list() {
        let output = run_plan(&planner(), &args("text", None)).await.unwrap();

        assert!(output.starts_with("Meal Plan (vegan)"));
        assert!(output.contains("BREAKFAST ($3.00, 390 kcal)"));
        assert!(output.contains("- Rice Bowl: $1.00, 150 kcal, 15 mins"));
        assert!(output.contains("Remaining budget: $18.00 of $30.00"));
        assert!(output.contains("Shopping List"));
        assert!(output.contains("- Tomato: 4.0 piece"));
    }

    #[tokio::test]
    async fn unsupported_format_fails_before_planning() {
        let planner = planner();
        let err = run_plan(&planner, &args("csv", None)).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported format: csv"));
        assert_eq!(planner.provider().call_count(), 0);
    }

    #[tokio::test]
    async fn saved_plan_feeds_shopping_list() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.json");

        run_plan(&planner(), &args("json", Some(path.clone())))
            .await
            .unwrap();
        assert!(path.exists());

        let json = run_shopping_list(&path, "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_items"], 9);

        assert!(run_shopping_list(&path, "yaml").is_err());

        let err = run_shopping_list(&tmp.path().join("missing.json"), "text").unwrap_err();
        let source = err.downcast_ref::<Error>().expect("mealcraft error");
        assert_eq!(source.kind(), ErrorKind::FileNotFound);
        assert_eq!(source.operation(), "plan::load");
    }

    #[test]
    fn summary_shows_failures() {
        use mealcraft_agent::{CategoryFailure, MealCategory};
        use std::collections::BTreeMap;

        let mut meals = BTreeMap::new();
        meals.insert(
            MealCategory::Dinner,
            CategoryResult::Failed(CategoryFailure::denied("Exceeds budget by $2.00")),
        );
        let plan = MealPlan {
            constraints: UserConstraints::default(),
            initial_budget: 10.0,
            remaining_budget: 10.0,
            meals,
            usage: Default::default(),
        };

        let text = render_summary(&plan);
        assert!(text.contains("DINNER (not planned)"));
        assert!(text.contains("! Exceeds budget by $2.00"));
    }
}
