//! Projection of stored records into the typed dashboard listing.
//!
//! The dashboard receives [`SummaryRecord`]s built here from the records
//! themselves; nothing is ever read back out of rendered markup.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::analysis::record::{StoredRecord, present};
use crate::protocol::SummaryRecord;

const UNTITLED: &str = "Untitled analysis";
const NO_SUMMARY: &str = "No summary available";
const UNKNOWN_RISK: &str = "Unknown";
const NO_SCORE: &str = "N/A";

/// Build the listing entry for one record.
///
/// Title and summary prefer the AI analysis and fall back to the rule-based
/// one. `risk` is the AI label as stored; `riskScore` is the rule-based
/// score as `"n/10"`. The date is the calendar day (`YYYY-MM-DD`) of the
/// record timestamp, or of the id when the timestamp is missing; records
/// from the same day share one activity bar.
pub fn summarize(id: &str, raw: &Value) -> SummaryRecord {
    let record = StoredRecord::from_value(raw.clone()).unwrap_or_default();
    let ai = record.ai_analysis();
    let rule = record.rule_based.as_ref();

    let title = present(ai.and_then(|a| a.clause_type.as_deref()))
        .or_else(|| present(rule.and_then(|r| r.clause_type.as_deref())))
        .unwrap_or(UNTITLED);

    let summary = present(ai.and_then(|a| a.summary.as_deref()))
        .or_else(|| present(rule.and_then(|r| r.summary.as_deref())))
        .unwrap_or(NO_SUMMARY);

    let risk = present(ai.and_then(|a| a.risk_level.as_deref())).unwrap_or(UNKNOWN_RISK);

    let risk_score = rule
        .and_then(|r| r.score())
        .map(|score| format!("{score}/10"))
        .unwrap_or_else(|| NO_SCORE.to_string());

    let date = present(record.timestamp.as_deref())
        .and_then(day_of)
        .or_else(|| day_of(id))
        .unwrap_or_else(|| present(record.timestamp.as_deref()).unwrap_or(id).to_string());

    SummaryRecord {
        id: id.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
        risk: risk.to_string(),
        risk_score,
        date,
    }
}

/// `YYYY-MM-DD` for an RFC 3339 timestamp or a `YYYYMMDD_HHMMSS` id.
fn day_of(text: &str) -> Option<String> {
    let text = text.trim();
    let day = if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        dt.date_naive()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.date()
    } else {
        // Collision suffixes (`_2`) follow the 15-character stamp.
        let stamp = text.get(..15)?;
        NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").ok()?.date()
    };
    Some(day.format("%Y-%m-%d").to_string())
}

/// Build the listing for a batch of `(id, record)` pairs, preserving order.
pub fn summarize_all(records: &[(String, Value)]) -> Vec<SummaryRecord> {
    records.iter().map(|(id, raw)| summarize(id, raw)).collect()
}
