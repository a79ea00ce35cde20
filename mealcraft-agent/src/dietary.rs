//! Dietary restrictions and their forbidden-ingredient vocabularies

use crate::meal::MealOption;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dietary tag as entered by the user.
///
/// Only the three known tags carry a forbidden-word list; any other value
/// (including "none") is kept verbatim and filters nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DietaryTag {
    None,
    Vegetarian,
    Vegan,
    GlutenFree,
    Other(String),
}

const VEGETARIAN_FORBIDDEN: &[&str] = &[
    "bacon", "sausage", "ham", "chicken", "turkey", "beef", "pork", "fish", "shellfish", "gelatin",
];

const VEGAN_FORBIDDEN: &[&str] = &[
    "egg", "yogurt", "honey", "milk", "butter", "cheese", "cream", "gelatin", "mayonnaise",
];

const GLUTEN_FREE_FORBIDDEN: &[&str] = &[
    "wheat", "bread", "pancake", "waffle", "croissant", "bagel", "muffin", "cereal",
    "french toast", "pasta", "flour", "barley", "rye", "crackers", "cookies", "cake",
];

impl DietaryTag {
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "" | "none" => DietaryTag::None,
            "vegetarian" => DietaryTag::Vegetarian,
            "vegan" => DietaryTag::Vegan,
            "gluten-free" | "gluten free" | "gluten_free" => DietaryTag::GlutenFree,
            other => DietaryTag::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DietaryTag::None => "none",
            DietaryTag::Vegetarian => "vegetarian",
            DietaryTag::Vegan => "vegan",
            DietaryTag::GlutenFree => "gluten-free",
            DietaryTag::Other(tag) => tag,
        }
    }

    pub fn forbidden_words(&self) -> &'static [&'static str] {
        match self {
            DietaryTag::Vegetarian => VEGETARIAN_FORBIDDEN,
            DietaryTag::Vegan => VEGAN_FORBIDDEN,
            DietaryTag::GlutenFree => GLUTEN_FREE_FORBIDDEN,
            DietaryTag::None | DietaryTag::Other(_) => &[],
        }
    }

    /// First forbidden term found in the option's ingredients.
    ///
    /// Matching is a case-insensitive substring test over all ingredients
    /// joined by spaces, so "egg" also catches "eggs" and "scrambled egg".
    pub fn forbidden_in(&self, option: &MealOption) -> Option<&'static str> {
        let forbidden = self.forbidden_words();
        if forbidden.is_empty() {
            return None;
        }
        let ingredients = option.ingredients.join(" ").to_lowercase();
        forbidden
            .iter()
            .copied()
            .find(|word| ingredients.contains(word))
    }
}

impl Default for DietaryTag {
    fn default() -> Self {
        DietaryTag::None
    }
}

impl From<String> for DietaryTag {
    fn from(value: String) -> Self {
        DietaryTag::parse(&value)
    }
}

impl From<&str> for DietaryTag {
    fn from(value: &str) -> Self {
        DietaryTag::parse(value)
    }
}

impl From<DietaryTag> for String {
    fn from(tag: DietaryTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for DietaryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
