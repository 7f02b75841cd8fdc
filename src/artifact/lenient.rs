//! Shape-tolerant field readers.
//!
//! Recipe text comes from a language model and older records were written
//! back exactly as the model returned them, so a field typed as text may hold
//! a list, a number or `null`. These readers coerce such values instead of
//! rejecting the record. Use them with `#[serde(default, deserialize_with)]`.

use crate::artifact::Language;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Plain text for any JSON value. Lists become one item per line, objects
/// their values separated by spaces, `null` the empty string.
pub(crate) fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .into_iter()
            .map(|(_, v)| value_text(v))
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn digits_in(s: &str) -> Option<u64> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn whole_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        // "30", "30 minutes", "约30分钟"
        Value::String(s) => digits_in(s),
        _ => None,
    }
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_text)
        .unwrap_or_default())
}

/// `None` for missing, `null` or blank values.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = text(deserializer)?;
    Ok((!text.trim().is_empty()).then_some(text))
}

/// A list of text items. A lone string is a one-item list. Items keep their
/// positions, so step lists stay aligned with their images.
pub(crate) fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(value_text).collect(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(other) => vec![value_text(other)],
    })
}

/// Image slots: strings are images, anything else an empty slot.
pub(crate) fn image_list<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(url) if !url.trim().is_empty() => Some(url),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(whole_number)
        .and_then(|n| u32::try_from(n).ok()))
}

/// Counters such as likes and views; unreadable values count as zero.
pub(crate) fn counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(whole_number)
        .unwrap_or(0))
}

/// RFC 3339 strings or epoch milliseconds.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}

pub(crate) fn language<'de, D>(deserializer: D) -> Result<Option<Language>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}
