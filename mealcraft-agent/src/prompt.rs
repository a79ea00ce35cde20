//! Prompt templates for the category specialists

use crate::budget::CategoryCaps;
use crate::contract::RESPONSE_FORMAT;
use crate::meal::{MealCategory, UserConstraints};
use mealcraft_llm::ChatMessage;

fn specialist_role(category: MealCategory) -> &'static str {
    match category {
        MealCategory::Breakfast => {
            "You are a breakfast specialist AI. Your responsibilities:\n\
             1. Suggest a set number of breakfast options matching the user's dietary needs.\n\
             2. Ensure meals take a reasonable preparation time.\n\
             3. Include cost estimates for each option."
        }
        MealCategory::Lunch => {
            "You are a lunch planning AI. Your responsibilities:\n\
             1. Suggest a set number of balanced lunch options matching the user's dietary needs.\n\
             2. Favor meals that can be prepared ahead or packed.\n\
             3. Include cost estimates for each option."
        }
        MealCategory::Dinner => {
            "You are a dinner planning AI. Your responsibilities:\n\
             1. Suggest a set number of satisfying dinner options matching the user's dietary needs.\n\
             2. Keep cooking steps within the user's preparation time.\n\
             3. Include cost estimates for each option."
        }
        MealCategory::Snacks => {
            "You are a snack optimization AI. Your responsibilities:\n\
             1. Suggest a set number of healthy snacks matching dietary needs.\n\
             2. Ensure each snack falls within a reasonable calorie range.\n\
             3. Ensure snacks complement daily nutrition and dietary goals."
        }
    }
}

/// System message for a category specialist.
pub fn system_message(category: MealCategory) -> String {
    format!(
        "{}\n\nAlways answer with a single JSON object in this format:\n{}",
        specialist_role(category),
        RESPONSE_FORMAT
    )
}

/// User message carrying the numeric caps and the user's constraints.
pub fn user_message(
    category: MealCategory,
    constraints: &UserConstraints,
    caps: &CategoryCaps,
) -> String {
    format!(
        "Create exactly 3 {noun} options that:\n\
         - Strictly follow {dietary} dietary restrictions\n\
         - Have combined cost ≤ ${budget:.2}\n\
         - Total calories ≤ {calories:.0}kcal\n\
         - No single meal exceeds ${per_meal:.2}\n\
         - Can each be prepared in {prep_time} or less\n\
         - Use diverse ingredients and cooking methods\n\
         - Use diverse protein sources\n\
         - Use labeled gluten-free or plant-based ingredients where necessary\n\
         - If constraints conflict, prioritize diet restrictions over cost\n\
         - Format response as:\n{format}",
        noun = category.noun(),
        dietary = constraints.dietary,
        budget = caps.budget,
        calories = caps.calories,
        per_meal = caps.per_meal,
        prep_time = constraints.prep_time,
        format = RESPONSE_FORMAT,
    )
}

/// Full conversation for one generation attempt.
pub fn build_messages(
    category: MealCategory,
    constraints: &UserConstraints,
    caps: &CategoryCaps,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_message(category)),
        ChatMessage::user(user_message(category, constraints, caps)),
    ]
}
