//! Loose view of a stored analysis record.
//!
//! Stored records outlive the code that wrote them: older records use
//! snake_case keys, some lack the AI half, some carry a score as text. A
//! [`StoredRecord`] accepts all of that, every field optional, and leaves
//! the choice of fallback text to whoever renders it. A field of the wrong
//! type reads as absent instead of failing the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A saved analysis with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredRecord {
    #[serde(alias = "analysis_id", deserialize_with = "lenient")]
    pub analysis_id: Option<String>,
    #[serde(alias = "clause_text", deserialize_with = "lenient")]
    pub clause_text: Option<String>,
    #[serde(
        alias = "rule_based",
        alias = "rule_result",
        deserialize_with = "lenient"
    )]
    pub rule_based: Option<RuleFields>,
    #[serde(alias = "ai_based", alias = "ai_result", deserialize_with = "lenient")]
    pub ai_based: Option<AiFields>,
    #[serde(deserialize_with = "lenient")]
    pub timestamp: Option<String>,
}

/// Rule-based half of a stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleFields {
    #[serde(alias = "clause_type", deserialize_with = "lenient")]
    pub clause_type: Option<String>,
    /// A number, or text such as `"6"` or `"6/10"`.
    #[serde(alias = "risk_score")]
    pub risk_score: Option<Value>,
    #[serde(deserialize_with = "lenient_list")]
    pub flags: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub summary: Option<String>,
}

/// AI half of a stored record; `error` set means the AI call failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiFields {
    #[serde(deserialize_with = "lenient")]
    pub error: Option<String>,
    #[serde(alias = "clause_type", deserialize_with = "lenient")]
    pub clause_type: Option<String>,
    #[serde(alias = "risk_level", deserialize_with = "lenient")]
    pub risk_level: Option<String>,
    #[serde(alias = "key_terms", deserialize_with = "lenient_list")]
    pub key_terms: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub recommendations: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

/// The field as `T`, or `None` when it has another shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// The string items of a list; other items are dropped. Not a list: `None`.
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

impl StoredRecord {
    /// Parse a raw JSON record.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The AI half, only when it holds an actual analysis.
    pub fn ai_analysis(&self) -> Option<&AiFields> {
        self.ai_based.as_ref().filter(|ai| ai.error.is_none())
    }

    /// The AI failure message, when the AI half failed.
    pub fn ai_error(&self) -> Option<&str> {
        self.ai_based.as_ref().and_then(|ai| ai.error.as_deref())
    }
}

impl RuleFields {
    /// The numeric score, if one can be read.
    pub fn score(&self) -> Option<u8> {
        match self.risk_score.as_ref()? {
            Value::Number(n) => n.as_u64().map(|n| n.min(10) as u8),
            Value::String(s) => s
                .split('/')
                .next()
                .and_then(|n| n.trim().parse::<u64>().ok())
                .map(|n| n.min(10) as u8),
            _ => None,
        }
    }
}

/// Non-blank trimmed text, or `None`.
pub(crate) fn present(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
