/// Parsing and validation of the model's structured reply.
///
/// Models often wrap JSON in markdown fences or put a sentence in front of
/// it. The reply is reduced to the outermost `{ ... }` object, parsed, and
/// checked for every required field before it becomes an [`AiAnalysis`].
use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};

use crate::analysis::{AiAnalysis, RiskLevel};

/// Fields the model must always return.
pub const REQUIRED_FIELDS: &[&str] = &[
    "clause_type",
    "key_terms",
    "risk_level",
    "summary",
    "recommendations",
];

/// Parse a raw model reply into a validated analysis.
pub fn parse_ai_reply(reply: &str) -> Result<AiAnalysis> {
    let json = extract_json_object(reply).ok_or_else(|| anyhow!("AI reply contained no JSON object"))?;
    let value: Value = serde_json::from_str(json).context("AI reply is not valid JSON")?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("AI reply is not a JSON object"))?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(*field) {
            return Err(anyhow!("Missing required field: {field}"));
        }
    }

    let risk_label = string_field(object, "risk_level")?;
    let risk_level = RiskLevel::parse(&risk_label)
        .ok_or_else(|| anyhow!("Unrecognized risk level: {risk_label}"))?;

    Ok(AiAnalysis {
        clause_type: string_field(object, "clause_type")?,
        risk_level,
        key_terms: distinct(list_field(object, "key_terms")?),
        summary: string_field(object, "summary")?,
        recommendations: list_field(object, "recommendations")?,
    })
}

/// Slice out the outermost JSON object, skipping fences and preamble.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn string_field(object: &Map<String, Value>, field: &str) -> Result<String> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        _ => Err(anyhow!("Field '{field}' must be a string")),
    }
}

/// Accept a list of strings, or a single string treated as one item.
fn list_field(object: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    match object.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                _ => Err(anyhow!("Field '{field}' must contain only strings")),
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(vec![s.trim().to_string()]),
        Some(Value::String(_)) => Ok(Vec::new()),
        _ => Err(anyhow!("Field '{field}' must be a list")),
    }
}

/// Deduplicate case-insensitively, keeping first occurrences.
fn distinct(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
