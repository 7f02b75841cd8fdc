//! Backend prompts for each pipeline stage.

use crate::artifact::Language;

fn kitchen_setting(language: Language) -> &'static str {
    match language {
        Language::Zh => {
            "a traditional Chinese kitchen with wooden utensils and bamboo steamers in the background"
        }
        Language::En => {
            "a modern North American kitchen with stainless steel appliances and granite countertops in the background"
        }
    }
}

/// Content prompt asking for one JSON object carrying both languages.
pub fn content_prompt(requested_name: &str, language: Language) -> String {
    let asked_in = match language {
        Language::Zh => "Chinese",
        Language::En => "English",
    };

    format!(
        r#"Create a detailed home-cooking recipe for "{requested_name}". The user asked in {asked_in}; provide every text field in both Simplified Chinese (_zh) and English (_en).

Return a single JSON object with exactly these fields:
{{
  "name_zh": "dish name in Chinese",
  "name_en": "dish name in English",
  "description_zh": "one-sentence introduction in Chinese (under 20 characters)",
  "description_en": "one-sentence introduction in English (under 50 characters)",
  "emoji": "one fitting emoji",
  "cookTime": cooking time in minutes (number),
  "difficulty_zh": "简单/中等/困难",
  "difficulty_en": "Easy/Medium/Hard",
  "servings": number of servings (number),
  "ingredients_zh": ["ingredient with amount", "..."],
  "ingredients_en": ["ingredient with amount", "..."],
  "steps_zh": ["detailed step", "..."],
  "steps_en": ["detailed step", "..."],
  "tips_zh": "cooking tips in Chinese",
  "tips_en": "cooking tips in English"
}}

The step lists must describe the same steps in the same order. Each step should name the concrete action and the visible state of the food so it can be illustrated. Return only the JSON object, nothing else."#
    )
}

/// Hero image of the finished dish.
pub fn hero_image_prompt(dish_name: &str, language: Language) -> String {
    format!(
        "A hand-painted watercolor illustration of the finished {dish_name}, plated and ready to serve, \
         with gentle steam rising. Warm, calm colors and soft afternoon light give it a cozy, \
         storybook feel, with {kitchen}.",
        kitchen = kitchen_setting(language)
    )
}

/// Image for the step at zero-based `index`.
pub fn step_image_prompt(dish_name: &str, index: usize, step: &str) -> String {
    format!(
        "A hand-painted watercolor panel showing step {number} of cooking {dish_name}: \"{step}\". \
         Show the cook's hands performing this action in a warm, cozy kitchen with soft light, \
         with the ingredients and their state clearly visible, in the calm style of an illustrated cookbook.",
        number = index + 1
    )
}
