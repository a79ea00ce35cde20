//! Shopping list consolidation and export
//!
//! Ingredient strings from every accepted option are turned into records,
//! sorted into store sections by keyword and merged by lowercased name and
//! unit.

use crate::meal::MealSuggestion;
use crate::planner::MealPlan;
use mealcraft_llm::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_UNIT: &str = "piece";
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Store sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreCategory {
    Produce,
    Dairy,
    Meat,
    Pantry,
    Frozen,
    Bakery,
    Deli,
    Other,
}

/// Sections tried when categorizing; the more specific ones go first so
/// "frozen peas" is not filed under produce.
const MATCH_ORDER: [StoreCategory; 7] = [
    StoreCategory::Frozen,
    StoreCategory::Deli,
    StoreCategory::Bakery,
    StoreCategory::Meat,
    StoreCategory::Produce,
    StoreCategory::Pantry,
    StoreCategory::Dairy,
];

impl StoreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreCategory::Produce => "produce",
            StoreCategory::Dairy => "dairy",
            StoreCategory::Meat => "meat",
            StoreCategory::Pantry => "pantry",
            StoreCategory::Frozen => "frozen",
            StoreCategory::Bakery => "bakery",
            StoreCategory::Deli => "deli",
            StoreCategory::Other => "other",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            StoreCategory::Produce => &[
                "vegetable", "fruit", "herb", "tomato", "lettuce", "spinach", "kale", "onion",
                "garlic", "carrot", "potato", "broccoli", "cucumber", "zucchini", "eggplant",
                "mushroom", "celery", "avocado", "apple", "banana", "berries", "berry", "lemon",
                "lime", "orange", "mango", "basil", "cilantro", "parsley", "green bean", "veggie",
                "squash",
            ],
            StoreCategory::Dairy => &["milk", "cheese", "yogurt", "butter", "cream", "egg"],
            StoreCategory::Meat => &[
                "beef", "chicken", "pork", "fish", "turkey", "salmon", "tuna", "shrimp", "bacon",
                "sausage", "lamb",
            ],
            StoreCategory::Pantry => &[
                // Oats and salt only as phrases: bare "oats"/"salt" hit "goats milk"
                // and "unsalted butter"
                "grain", "canned", "spice", "oils", "olive oil", "rice", "pasta", "noodle",
                "flour", "rolled oats", "oatmeal", "quinoa", "lentil", "bean", "chickpea",
                "sugar", "sea salt", "kosher salt", "table salt", "honey", "vinegar", "sauce",
                "salsa", "peanut butter", "almond butter", "nuts",
            ],
            StoreCategory::Frozen => &["frozen"],
            StoreCategory::Bakery => &[
                "bread", "pastries", "pastry", "baked goods", "bagel", "tortilla", "croissant",
                "muffin", "pita", "baguette",
            ],
            StoreCategory::Deli => &["deli", "prepared food", "salami", "prosciutto", "hummus"],
            StoreCategory::Other => &[],
        }
    }

    /// Section for an ingredient name; first keyword hit wins.
    pub fn categorize(name: &str) -> StoreCategory {
        let name = name.to_lowercase();
        MATCH_ORDER
            .iter()
            .copied()
            .find(|category| category.keywords().iter().any(|k| name.contains(k)))
            .unwrap_or(StoreCategory::Other)
    }
}

impl fmt::Display for StoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: StoreCategory,
    pub estimated_price: f64,
}

impl Ingredient {
    /// A record for a bare ingredient string: one piece, no price
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_string();
        Self {
            category: StoreCategory::categorize(&name),
            name,
            quantity: DEFAULT_QUANTITY,
            unit: DEFAULT_UNIT.to_string(),
            estimated_price: 0.0,
        }
    }
}

/// Merge records sharing a lowercased name and unit, keeping first-seen order
/// and the first spelling.
pub fn consolidate(ingredients: impl IntoIterator<Item = Ingredient>) -> Vec<Ingredient> {
    let mut merged: Vec<Ingredient> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for ingredient in ingredients {
        let key = (ingredient.name.to_lowercase(), ingredient.unit.clone());
        match index.get(&key) {
            Some(&i) => {
                merged[i].quantity += ingredient.quantity;
                merged[i].estimated_price += ingredient.estimated_price;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(ingredient);
            }
        }
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::unsupported_format(other).with_operation("shopping::export")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    /// Only non-empty sections, in display order
    pub categorized_list: BTreeMap<StoreCategory, Vec<Ingredient>>,
    pub total_items: usize,
    pub total_estimated_cost: f64,
}

impl ShoppingList {
    pub fn from_ingredients(ingredients: impl IntoIterator<Item = Ingredient>) -> Self {
        let merged = consolidate(ingredients);
        let total_items = merged.len();
        let total_estimated_cost = merged.iter().map(|i| i.estimated_price).sum();

        let mut categorized_list: BTreeMap<StoreCategory, Vec<Ingredient>> = BTreeMap::new();
        for ingredient in merged {
            categorized_list
                .entry(ingredient.category)
                .or_default()
                .push(ingredient);
        }

        Self {
            categorized_list,
            total_items,
            total_estimated_cost,
        }
    }

    pub fn from_suggestions<'a>(suggestions: impl IntoIterator<Item = &'a MealSuggestion>) -> Self {
        Self::from_ingredients(
            suggestions
                .into_iter()
                .flat_map(|s| s.options.iter())
                .flat_map(|o| o.ingredients.iter())
                .map(|name| Ingredient::from_name(name)),
        )
    }

    /// Shopping list for every accepted category of a plan
    pub fn from_plan(plan: &MealPlan) -> Self {
        Self::from_suggestions(plan.suggestions().map(|(_, s)| s))
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    /// Export as `"text"` or `"json"`; other formats are `Unsupported`.
    pub fn export(&self, format: &str) -> Result<String> {
        self.render(format.parse()?)
    }

    pub fn render(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Text => Ok(self.to_text()),
            ExportFormat::Json => serde_json::to_string_pretty(self).map_err(|e| {
                Error::serialization_failed(format!("failed to serialize shopping list: {}", e))
                    .with_operation("shopping::export")
                    .set_source(e)
            }),
        }
    }

    fn to_text(&self) -> String {
        let rule = "=".repeat(50);
        let mut lines = vec!["Shopping List\n".to_string(), format!("{}\n", rule)];

        for (category, items) in &self.categorized_list {
            let heading = category.as_str();
            lines.push(format!("\n{}", heading.to_uppercase()));
            lines.push("-".repeat(heading.len()));
            for item in items {
                lines.push(format!(
                    "- {}: {} {}",
                    item.name,
                    format_quantity(item.quantity),
                    item.unit
                ));
            }
        }

        lines.push(format!("\n{}", rule));
        lines.push(format!("Total Items: {}", self.total_items));
        lines.push(format!(
            "Estimated Total Cost: ${:.2}",
            self.total_estimated_cost
        ));
        lines.join("\n")
    }
}

/// Quantities always show a decimal point ("1.0", "2.5")
fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.is_finite() {
        format!("{:.1}", quantity)
    } else {
        quantity.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal::MealOption;
    use mealcraft_llm::ErrorKind;

    fn suggestion(ingredients: &[&[&str]]) -> MealSuggestion {
        MealSuggestion::new(
            ingredients
                .iter()
                .enumerate()
                .map(|(i, items)| MealOption {
                    name: format!("Meal {}", i),
                    description: String::new(),
                    calories: 100,
                    cost: 1.0,
                    prep_time: "5 mins".into(),
                    ingredients: items.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_case_insensitive_merge() {
        let list = ShoppingList::from_ingredients(
            ["Tomato", "tomato"].iter().map(|n| Ingredient::from_name(n)),
        );
        assert_eq!(list.total_items, 1);
        let produce = &list.categorized_list[&StoreCategory::Produce];
        assert_eq!(produce.len(), 1);
        assert_eq!(produce[0].name, "Tomato");
        assert_eq!(produce[0].quantity, 2.0);
        assert_eq!(produce[0].unit, "piece");
    }

    #[test]
    fn test_different_units_stay_separate() {
        let mut cup = Ingredient::from_name("milk");
        cup.unit = "cup".to_string();
        cup.estimated_price = 0.5;
        let mut piece = Ingredient::from_name("Milk");
        piece.estimated_price = 1.25;

        let merged = consolidate(vec![cup.clone(), piece, cup]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity, 2.0);
        assert_eq!(merged[0].estimated_price, 1.0);

        let list = ShoppingList::from_ingredients(merged);
        assert_eq!(list.total_estimated_cost, 2.25);
    }

    #[test]
    fn test_categorize() {
        assert_eq!(StoreCategory::categorize("Cheddar Cheese"), StoreCategory::Dairy);
        assert_eq!(StoreCategory::categorize("chicken breast"), StoreCategory::Meat);
        assert_eq!(StoreCategory::categorize("frozen peas"), StoreCategory::Frozen);
        assert_eq!(StoreCategory::categorize("Whole wheat bread"), StoreCategory::Bakery);
        assert_eq!(StoreCategory::categorize("brown rice"), StoreCategory::Pantry);
        assert_eq!(StoreCategory::categorize("peanut butter"), StoreCategory::Pantry);
        assert_eq!(StoreCategory::categorize("goats milk"), StoreCategory::Dairy);
        assert_eq!(StoreCategory::categorize("unsalted butter"), StoreCategory::Dairy);
        assert_eq!(StoreCategory::categorize("Rolled oats"), StoreCategory::Pantry);
        assert_eq!(StoreCategory::categorize("sea salt"), StoreCategory::Pantry);
        assert_eq!(StoreCategory::categorize("eggplant"), StoreCategory::Produce);
        assert_eq!(StoreCategory::categorize("tofu"), StoreCategory::Other);
    }

    #[test]
    fn test_sections_in_display_order() {
        let list = ShoppingList::from_suggestions([&suggestion(&[
            &["tofu", "rice"],
            &["spinach", "feta cheese"],
        ])]);
        let order: Vec<_> = list.categorized_list.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                StoreCategory::Produce,
                StoreCategory::Dairy,
                StoreCategory::Pantry,
                StoreCategory::Other
            ]
        );
        assert_eq!(list.total_items, 4);
    }

    #[test]
    fn test_text_export() {
        let list = ShoppingList::from_suggestions([&suggestion(&[&["Tomato", "tomato", "rice"]])]);
        let text = list.export("text").unwrap();

        assert!(text.starts_with("Shopping List\n"));
        assert!(text.contains("PRODUCE\n-------\n- Tomato: 2.0 piece"));
        assert!(text.contains("- rice: 1.0 piece"));
        assert!(text.contains("Total Items: 2"));
        assert!(text.ends_with("Estimated Total Cost: $0.00"));
    }

    #[test]
    fn test_json_export() {
        let list = ShoppingList::from_suggestions([&suggestion(&[&["banana"]])]);
        let json = list.export("json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_items"], 1);
        assert_eq!(value["categorized_list"]["produce"][0]["name"], "banana");
    }

    #[test]
    fn test_unsupported_format() {
        let list = ShoppingList::from_suggestions([&suggestion(&[&["banana"]])]);
        let err = list.export("csv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.message(), "Unsupported format: csv");
    }

    #[test]
    fn test_empty_list() {
        let list = ShoppingList::from_suggestions(std::iter::empty());
        assert!(list.is_empty());
        assert!(list.categorized_list.is_empty());
        assert!(!list.export("text").unwrap().is_empty());
    }
}
