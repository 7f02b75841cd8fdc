//! Artifact data model
//!
//! An artifact is one finished recipe: bilingual text content, a hero image and
//! an ordered list of step images. Records are stored with the field names the
//! serving layer already reads, so older single-language records load too.

pub(crate) mod lenient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Content language. `Zh` is the primary language and the default for records
/// that predate the language field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "cn" | "primary" => Ok(Language::Zh),
            "en" | "secondary" => Ok(Language::En),
            other => Err(format!("unknown language '{}' (expected 'zh' or 'en')", other)),
        }
    }
}

/// A completed generation result.
///
/// `likes` and `views` belong to the serving layer; this crate only
/// initialises them. Fields this crate does not model are kept in `extra`
/// so rewriting the whole collection never drops them. Modeled fields are
/// read leniently: one odd record must not make the collection unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,

    /// Single name of a legacy single-language record.
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub name_zh: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub description_zh: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub description_en: String,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub emoji: String,
    #[serde(rename = "cookTime", default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub difficulty_zh: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub difficulty_en: String,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,

    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Vec::is_empty")]
    pub ingredients_zh: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Vec::is_empty")]
    pub ingredients_en: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Vec::is_empty")]
    pub steps_zh: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text_list", skip_serializing_if = "Vec::is_empty")]
    pub steps_en: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub tips_zh: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub tips_en: String,

    /// Hero image of the finished dish.
    #[serde(rename = "imageUrl", default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// One entry per step, `None` where no image exists for that step.
    #[serde(rename = "stepImages", default, deserialize_with = "lenient::image_list")]
    pub step_images: Vec<Option<String>>,

    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub author_zh: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub author_en: Option<String>,
    #[serde(rename = "authorId", default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient::counter")]
    pub likes: u64,
    #[serde(default, deserialize_with = "lenient::counter")]
    pub views: u64,

    /// Language the record was requested in.
    #[serde(default, deserialize_with = "lenient::language", skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Artifact {
    /// Legacy records carry a single `name` and no per-language names.
    pub fn is_legacy(&self) -> bool {
        self.name_zh.is_none() && self.name_en.is_none()
    }

    /// Language of a record, defaulting to the primary language.
    pub fn record_language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn name_for(&self, language: Language) -> Option<&str> {
        let localized = match language {
            Language::Zh => self.name_zh.as_deref(),
            Language::En => self.name_en.as_deref(),
        };
        localized.or_else(|| {
            if self.is_legacy() && self.record_language() == language {
                self.name.as_deref()
            } else {
                None
            }
        })
    }

    /// Best available name for listings: requested language first, then any.
    pub fn display_name(&self, language: Language) -> &str {
        self.name_for(language)
            .or(self.name_zh.as_deref())
            .or(self.name_en.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    pub fn steps_for(&self, language: Language) -> &[String] {
        match language {
            Language::Zh => &self.steps_zh,
            Language::En => &self.steps_en,
        }
    }

    /// Number of steps that have an image.
    pub fn illustrated_steps(&self) -> usize {
        self.step_images.iter().filter(|image| image.is_some()).count()
    }
}
