//! Content extraction
//!
//! The content backend answers in free text that should contain a JSON object.
//! Extraction is heuristic: a fenced block first, then the outermost brace
//! span, then the whole trimmed response.

use crate::artifact::{lenient, Language};
use crate::error::ApiError;
use serde::Deserialize;

/// Structured content returned by the content stage, for both languages.
///
/// Single-language keys (`name`, `steps`, ...) are accepted as well and fill
/// the requested language's fields when those are missing. Field shapes are
/// not enforced: `null` reads as empty, lists of tips join into one text and
/// structured list items are flattened to text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratedContent {
    #[serde(deserialize_with = "lenient::text")]
    pub name_zh: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name_en: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description_zh: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description_en: String,
    #[serde(deserialize_with = "lenient::text")]
    pub emoji: String,
    #[serde(rename = "cookTime", deserialize_with = "lenient::count")]
    pub cook_time: Option<u32>,
    #[serde(deserialize_with = "lenient::text")]
    pub difficulty_zh: String,
    #[serde(deserialize_with = "lenient::text")]
    pub difficulty_en: String,
    #[serde(deserialize_with = "lenient::count")]
    pub servings: Option<u32>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub ingredients_zh: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub ingredients_en: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub steps_zh: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub steps_en: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub tips_zh: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tips_en: String,

    #[serde(deserialize_with = "lenient::text")]
    name: String,
    #[serde(deserialize_with = "lenient::text")]
    description: String,
    #[serde(deserialize_with = "lenient::text")]
    difficulty: String,
    #[serde(deserialize_with = "lenient::text_list")]
    ingredients: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    steps: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    tips: String,
}

impl GeneratedContent {
    pub fn name_for(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.name_zh,
            Language::En => &self.name_en,
        }
    }

    pub fn steps_for(&self, language: Language) -> &[String] {
        match language {
            Language::Zh => &self.steps_zh,
            Language::En => &self.steps_en,
        }
    }

    /// Move single-language keys into the requested language's slots.
    fn fill_from_single_language(&mut self, language: Language) {
        let (name, description, difficulty, ingredients, steps, tips) = match language {
            Language::Zh => (
                &mut self.name_zh,
                &mut self.description_zh,
                &mut self.difficulty_zh,
                &mut self.ingredients_zh,
                &mut self.steps_zh,
                &mut self.tips_zh,
            ),
            Language::En => (
                &mut self.name_en,
                &mut self.description_en,
                &mut self.difficulty_en,
                &mut self.ingredients_en,
                &mut self.steps_en,
                &mut self.tips_en,
            ),
        };

        fill_blank(name, &mut self.name);
        fill_blank(description, &mut self.description);
        fill_blank(difficulty, &mut self.difficulty);
        fill_blank(tips, &mut self.tips);
        if ingredients.is_empty() {
            *ingredients = std::mem::take(&mut self.ingredients);
        }
        if steps.is_empty() {
            *steps = std::mem::take(&mut self.steps);
        }
    }
}

fn fill_blank(target: &mut String, fallback: &mut String) {
    if target.trim().is_empty() && !fallback.trim().is_empty() {
        *target = std::mem::take(fallback);
    }
}

/// Locate the JSON payload inside a backend response.
pub fn extract_json_payload(text: &str) -> &str {
    if let Some(fenced) = fenced_object(text) {
        return fenced;
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text.trim()
}

/// Object inside a ```` ``` ```` or ```` ```json ```` fence. The object must
/// open the fence body and close it, apart from whitespace.
fn fenced_object(text: &str) -> Option<&str> {
    const FENCE: &str = "```";

    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(FENCE) {
        let open = search_from + offset + FENCE.len();
        let after_tag = text[open..].strip_prefix("json").unwrap_or(&text[open..]);
        let body = after_tag.trim_start();

        if body.starts_with('{') {
            if let Some(close) = body.find(FENCE) {
                let candidate = body[..close].trim_end();
                if candidate.ends_with('}') {
                    return Some(candidate);
                }
            }
        }
        search_from = open;
    }
    None
}

/// Extract and parse the content stage response for `language`. Fails only
/// when the payload is not a JSON object or has no name in `language`.
pub fn parse_content(text: &str, language: Language) -> Result<GeneratedContent, ApiError> {
    let payload = extract_json_payload(text);
    let mut content: GeneratedContent = serde_json::from_str(payload)
        .map_err(|e| ApiError::ContentParseError(format!("Failed to parse recipe JSON: {}", e)))?;

    content.fill_from_single_language(language);

    if content.name_for(language).trim().is_empty() {
        return Err(ApiError::ContentParseError(format!(
            "Recipe JSON has no '{}' name",
            language
        )));
    }

    Ok(content)
}
